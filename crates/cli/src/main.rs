use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use footprint_agents::{AgentSettings, ChatbotAgent};
use footprint_core::{
    keywords_for, score_intents, select_response, ChatContext, ChatRequest, ConversationTurn,
    Intent, PlanRequest,
};
use footprint_generative::{GeminiConfig, Generator, DEFAULT_GEMINI_MODEL};
use footprint_observability::{init_tracing, AppMetrics};
use footprint_storage::Store;
use serde_json::json;

type Agent = ChatbotAgent<Store, Generator>;

#[derive(Debug, Parser)]
#[command(name = "footprint")]
#[command(about = "Carbon footprint assistant CLI")]
struct Cli {
    #[command(flatten)]
    runtime: RuntimeArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct RuntimeArgs {
    /// Treat every user as premium and never call Gemini.
    #[arg(long, env = "MOCK_MODE", default_value_t = true, action = clap::ArgAction::Set)]
    mock_mode: bool,

    #[arg(long, env = "USE_GEMINI", default_value_t = false, action = clap::ArgAction::Set)]
    use_gemini: bool,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    #[arg(long, env = "GEMINI_TIMEOUT_SECONDS", default_value_t = 20)]
    gemini_timeout_seconds: u64,

    #[arg(long, env = "FOOTPRINT_DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat session.
    Chat {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        premium: bool,
        #[arg(long)]
        monthly_co2e: Option<f64>,
    },
    /// Classify one message and print the rule-based reply.
    Classify {
        message: String,
        #[arg(long)]
        premium: bool,
    },
    Intents,
    /// Show the keywords and canned reply for one intent label.
    Template {
        intent: String,
        #[arg(long)]
        premium: bool,
    },
    Plan {
        #[arg(long)]
        monthly_co2e: Option<f64>,
        #[arg(long)]
        reduction: Option<f64>,
        #[arg(long)]
        premium: bool,
    },
    /// Print the stored conversation for a user.
    History { user_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("footprint_cli");
    let cli = Cli::parse();

    let agent = build_agent(&cli.runtime).await?;

    match cli.command {
        Command::Chat {
            user_id,
            premium,
            monthly_co2e,
        } => {
            let context = ChatContext {
                is_premium: premium,
                monthly_co2e,
            };
            run_chat(agent, user_id, context).await?;
        }
        Command::Classify { message, premium } => {
            let scores = score_intents(&message)
                .into_iter()
                .map(|(intent, score)| json!({ "intent": intent, "score": score }))
                .collect::<Vec<_>>();

            let reply = agent
                .handle_chat(ChatRequest {
                    message,
                    context: ChatContext {
                        is_premium: premium,
                        monthly_co2e: None,
                    },
                    ..ChatRequest::default()
                })
                .await?;

            let output = json!({
                "intent": reply.intent,
                "scores": scores,
                "reply": reply,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Intents => {
            println!("{}", serde_json::to_string_pretty(&agent.intent_catalog())?);
        }
        Command::Template { intent, premium } => {
            let intent: Intent = intent.parse()?;
            let output = json!({
                "intent": intent,
                "keywords": keywords_for(intent),
                "reply": select_response(intent, premium),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Plan {
            monthly_co2e,
            reduction,
            premium,
        } => {
            let plan = agent.premium_plan(&PlanRequest {
                is_premium: premium,
                monthly_co2e,
                goal_reduction_percent: reduction,
            })?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::History { user_id } => {
            let turns = agent.conversation(&user_id).await?;
            println!("{}", serde_json::to_string_pretty(&turns)?);
        }
    }

    Ok(())
}

async fn run_chat(agent: Agent, user_id: Option<String>, context: ChatContext) -> Result<()> {
    // Without a user id nothing is stored, so the session keeps its own history.
    let mut history: Vec<ConversationTurn> = Vec::new();

    println!("Carbon footprint assistant. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = agent
            .handle_chat(ChatRequest {
                message: message.to_string(),
                user_id: user_id.clone(),
                history: history.clone(),
                context: context.clone(),
            })
            .await?;

        history.push(ConversationTurn::user(message, Utc::now()));
        history.push(ConversationTurn::assistant(&reply.payload.text, reply.timestamp));

        println!("\n[{}] {}\n", reply.intent, reply.payload.text);

        if !reply.payload.tips.is_empty() {
            println!("Tips:");
            for tip in &reply.payload.tips {
                println!("- {}: {}", tip.title, tip.description);
            }
            println!();
        }

        if !reply.payload.quick_replies.is_empty() {
            println!("Try: {}\n", reply.payload.quick_replies.join(" | "));
        }

        if reply.intent == Intent::SubscribePremium && !context.is_premium {
            println!("(run with --premium to preview premium replies)\n");
        }
    }

    Ok(())
}

async fn build_agent(runtime: &RuntimeArgs) -> Result<Agent> {
    let metrics = AppMetrics::shared();

    let store = match runtime.database_url.as_deref() {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };

    let timeout = Duration::from_secs(runtime.gemini_timeout_seconds);
    let api_key = runtime
        .gemini_api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty());

    let generator = match api_key {
        Some(api_key) if runtime.use_gemini => {
            let mut config = GeminiConfig::new(api_key);
            config.model = runtime.gemini_model.clone();
            config.request_timeout = timeout;
            Generator::gemini(config).context("failed to build gemini client")?
        }
        _ => Generator::disabled(),
    };

    let settings = AgentSettings {
        mock_mode: runtime.mock_mode,
        generative_timeout: timeout,
        ..AgentSettings::default()
    };

    Ok(ChatbotAgent::new(
        Arc::new(store),
        Arc::new(generator),
        settings,
        metrics,
    ))
}
