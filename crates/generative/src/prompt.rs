use crate::GenerationRequest;

pub const PROMPT_HISTORY_TURNS: usize = 5;

pub fn build_prompt(request: GenerationRequest<'_>) -> String {
    let recent = &request.history[request.history.len().saturating_sub(PROMPT_HISTORY_TURNS)..];
    let history = if recent.is_empty() {
        "No history".to_string()
    } else {
        serde_json::to_string_pretty(recent).unwrap_or_else(|_| "No history".to_string())
    };

    let emissions = request
        .context
        .monthly_co2e
        .map(|value| value.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    format!(
        "You are a helpful carbon footprint assistant. Help users understand and reduce their environmental impact.\n\n\
         Context about the user:\n\
         - Premium user: {premium}\n\
         - Current emissions: {emissions} tCO₂e/month\n\n\
         Conversation history:\n{history}\n\n\
         User message: {message}\n\n\
         Provide a helpful, encouraging, and informative response. Keep it concise and actionable.",
        premium = request.context.is_premium,
        message = request.message,
    )
}
