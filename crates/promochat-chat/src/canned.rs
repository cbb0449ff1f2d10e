//! Offline replies used when every backend call has failed.

/// Topic a canned reply is chosen for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Default,
    Mechanics,
    Revenue,
}

const REVENUE_KEYWORDS: &[&str] = &["revenue", "monetiz", "monetis", "变现", "收入", "盈利", "赚钱"];
const MECHANICS_KEYWORDS: &[&str] = &["mechanic", "gameplay", "机制", "玩法", "规则"];

const DEFAULT_REPLY: &str = "抱歉，智能助手暂时无法连接。你可以先看看我们的游戏机制、技术架构或变现模式，稍后再来提问。\
|||了解游戏机制|查看技术架构|了解变现模式";

const MECHANICS_REPLY: &str = "核心玩法是每日幸运转盘加任务体系：完成任务获得抽奖次数，连续签到提升奖励倍率，好友助力还能解锁额外机会。\
|||转盘奖励有哪些|任务如何刷新|查看技术架构";

const REVENUE_REPLY: &str = "变现主要来自三部分：广告分成、增值道具和品牌联名活动，收入随活跃用户规模同步增长。\
|||广告分成比例|增值道具有哪些|如何参与合作";

/// Pick a topic by keyword; revenue is checked before mechanics.
pub fn topic_for(text: &str) -> Topic {
    let lowered = text.to_lowercase();
    if REVENUE_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Topic::Revenue
    } else if MECHANICS_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Topic::Mechanics
    } else {
        Topic::Default
    }
}

/// Encoded (`body|||suggestions`) reply for a topic
pub fn reply_for_topic(topic: Topic) -> &'static str {
    match topic {
        Topic::Default => DEFAULT_REPLY,
        Topic::Mechanics => MECHANICS_REPLY,
        Topic::Revenue => REVENUE_REPLY,
    }
}

/// Encoded canned reply for whatever the user asked
pub fn reply_for(user_text: &str) -> &'static str {
    reply_for_topic(topic_for(user_text))
}
