//! Prompt rendering for explanation requests.

use engagement_common::ExplainRequest;
use serde_json::Value;

pub const SYSTEM_PROMPT: &str = "You are a social media marketing analyst who advises small and \
medium businesses in Sri Lanka. Explain predicted post performance and give concrete, actionable \
ways to improve it. Always answer with a single JSON object in the requested format.";

const RESPONSE_SCHEMA: &str = r##"{
  "overall_assessment": "2-3 sentences on the expected performance",
  "performance_level": "Low | Moderate | Good | Excellent",
  "improvements": [
    {
      "metric": "Likes | Comments | Shares | Clicks | Timing Quality Score",
      "current_score": "predicted value",
      "improvement_tips": ["tip", "tip", "tip"]
    }
  ],
  "caption_advice": "how to make the caption more engaging for this content",
  "hashtag_suggestions": ["#tag1", "#tag2", "#tag3", "#tag4", "#tag5", "#tag6", "#tag7", "#tag8"],
  "content_quality_tips": ["visual or content tip", "another tip"],
  "best_posting_time": {
    "recommended_days": ["Monday", "Wednesday"],
    "recommended_hours": "e.g. 7 PM - 9 PM",
    "reasoning": "why this window works"
  },
  "platform_specific_tips": ["tip", "tip"],
  "ad_boost_advice": "whether and how to use paid boosting",
  "novelty_insight": "one non-obvious idea that could lift engagement significantly"
}"##;

/// Render the user prompt for one prediction.
pub fn user_prompt(request: &ExplainRequest) -> String {
    format!(
        "A social media post was analysed and the model predicted its engagement.\n\n\
         POST DETAILS:\n\
         - Platform: {platform}\n\
         - Caption: \"{caption}\"\n\
         - Content: \"{content}\"\n\
         - Post Date: {post_date}\n\
         - Post Time: {post_time}\n\
         - Followers: {followers}\n\
         - Ad Boost: {ad_boost}\n\n\
         PREDICTED PERFORMANCE:\n\
         - Likes: {likes}\n\
         - Comments: {comments}\n\
         - Shares: {shares}\n\
         - Clicks: {clicks}\n\
         - Timing Quality Score: {score} / 1.0\n\n\
         Write an explainability report for these predictions. Respond ONLY with a JSON object \
         that follows this schema:\n\n{schema}",
        platform = request.platform.as_deref().unwrap_or_default(),
        caption = text_or_placeholder(&request.caption),
        content = text_or_placeholder(&request.content),
        post_date = request.post_date.as_deref().unwrap_or_default(),
        post_time = request.post_time.as_deref().unwrap_or_default(),
        followers = render_value(&request.followers),
        ad_boost = if request.is_boosted() { "Yes" } else { "No" },
        likes = render_number(&request.likes, 0),
        comments = render_number(&request.comments, 0),
        shares = render_number(&request.shares, 0),
        clicks = render_number(&request.clicks, 0),
        score = render_number(&request.timing_quality_score, 2),
        schema = RESPONSE_SCHEMA,
    )
}

fn text_or_placeholder(value: &Option<String>) -> &str {
    match value.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => "Not provided",
    }
}

/// Numbers are rounded to `decimals`; anything else is shown as sent.
fn render_number(value: &Option<Value>, decimals: usize) -> String {
    match value {
        Some(Value::Number(n)) => match n.as_f64() {
            Some(x) => format!("{:.*}", decimals, x),
            None => n.to_string(),
        },
        other => render_value(other),
    }
}

fn render_value(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    }
}
