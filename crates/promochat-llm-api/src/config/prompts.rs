/// System instruction sent to the hosted relay.
///
/// It asks the model to append follow-up suggestions after `|||`, which the
/// chat layer splits back out of the reply.
pub const RELAY_SYSTEM_PROMPT: &str = "你是「幸运增长」产品页面上的智能助手，负责向访客介绍游戏机制、技术架构和变现模式。\
回答要简洁友好，使用中文，控制在 150 字以内。\
每次回答结束后，追加分隔符 ||| 并给出三个简短的后续问题建议，用 | 分隔，\
例如：回答正文|||问题一|问题二|问题三。不要在正文中使用 | 字符。";

/// System instruction sent to the local model server only.
///
/// The local model is not asked for the suggestion suffix.
pub const LOCAL_SYSTEM_PROMPT: &str = "You are a general assistant running on the visitor's own machine. \
The product-page topic and content restrictions of the hosted assistant do not apply in this mode. \
Reply in the language the user writes in.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_relay_prompt_requests_suggestions() {
        assert!(RELAY_SYSTEM_PROMPT.contains("|||"));
        assert!(!LOCAL_SYSTEM_PROMPT.contains("|||"));
    }
}
