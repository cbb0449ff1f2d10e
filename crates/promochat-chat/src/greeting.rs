//! Greetings shown when the chat opens.

use crate::canned::{topic_for, Topic};
use crate::suggestions::{encode, DEFAULT_SUGGESTIONS};

const WELCOME_BODY: &str =
    "你好！我是幸运增长的智能助手，可以为你介绍游戏机制、技术架构和变现模式。想先了解哪一部分？";

const MECHANICS_FOLLOW_UPS: [&str; 3] = ["转盘奖励有哪些", "任务如何刷新", "查看技术架构"];
const REVENUE_FOLLOW_UPS: [&str; 3] = ["广告分成比例", "增值道具有哪些", "如何参与合作"];

/// Encoded greeting for an opened chat.
///
/// A non-blank trigger (the label of whatever the visitor clicked) gets a
/// greeting about that subject; otherwise the generic welcome is used.
pub fn greeting_for(trigger: Option<&str>) -> String {
    match trigger.map(str::trim).filter(|t| !t.is_empty()) {
        Some(trigger) => {
            let follow_ups = match topic_for(trigger) {
                Topic::Mechanics => MECHANICS_FOLLOW_UPS,
                Topic::Revenue => REVENUE_FOLLOW_UPS,
                Topic::Default => DEFAULT_SUGGESTIONS,
            };
            let body = format!("你对「{}」感兴趣？这正是我擅长的话题，想从哪里聊起？", trigger);
            encode(&body, &follow_ups)
        }
        None => welcome(),
    }
}

pub fn welcome() -> String {
    encode(WELCOME_BODY, &DEFAULT_SUGGESTIONS)
}
