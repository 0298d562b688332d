//! Keyword intent classification for chat messages.
//!
//! Classification checks intents in a fixed order and the first intent with
//! a matching keyword wins, so "创建任务: 修改简历" is a create. English
//! keywords only match whole words; Chinese keywords match anywhere.

use std::sync::LazyLock;

use regex::Regex;

/// One case-insensitive alternation per intent, in classification order.
static PATTERNS: LazyLock<Vec<(Intent, Regex)>> = LazyLock::new(|| {
    Intent::ORDERED
        .into_iter()
        .map(|intent| (intent, keyword_pattern(intent.keywords())))
        .collect()
});

fn keyword_pattern(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|k| {
            if k.is_ascii() {
                format!(r"\b{}\b", regex::escape(k))
            } else {
                regex::escape(k)
            }
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternation}")).unwrap()
}

/// What a chat message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Create,
    Modify,
    Delete,
    Complete,
    Summary,
    List,
    Unknown,
}

impl Intent {
    /// Classification order.
    const ORDERED: [Intent; 6] = [
        Intent::Create,
        Intent::Modify,
        Intent::Delete,
        Intent::Complete,
        Intent::Summary,
        Intent::List,
    ];

    /// Trigger keywords, matched case-insensitively.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Intent::Create => &[
                "创建任务",
                "新建任务",
                "加个任务",
                "添加任务",
                "新任务",
                "create task",
                "new task",
                "add task",
            ],
            Intent::Modify => &["修改", "更改", "改一下", "换个", "改到", "modify", "change"],
            Intent::Delete => &["删除", "删掉", "去掉", "移除", "delete", "remove"],
            Intent::Complete => &["完成", "做完", "结束", "搞定", "complete", "finish"],
            Intent::Summary => &["总结", "summary", "概况", "状态", "overview"],
            Intent::List => &["任务列表", "有哪些任务", "列出任务", "list tasks", "show tasks"],
            Intent::Unknown => &[],
        }
    }

    pub fn classify(message: &str) -> Intent {
        PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(message))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::Unknown)
    }

    fn pattern(&self) -> Option<&'static Regex> {
        PATTERNS
            .iter()
            .find(|(intent, _)| intent == self)
            .map(|(_, re)| re)
    }

    /// Remove the earliest keyword occurrence for this intent and trim what
    /// is left, e.g. "删除买菜" becomes "买菜".
    pub fn strip_keyword(&self, message: &str) -> String {
        match self.pattern().and_then(|re| re.find(message)) {
            Some(m) => format!("{}{}", &message[..m.start()], &message[m.end()..])
                .trim()
                .to_string(),
            None => message.trim().to_string(),
        }
    }
}
