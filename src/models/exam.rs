use chrono::NaiveTime;
use std::fmt;

/// 每道题固定的选项栏位数
pub const OPTION_SLOTS: usize = 4;

/// 单个选项
///
/// `slot` 是选项在题库中的原始栏位（0..4），空栏位被过滤但不重新编号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub slot: u8,
    pub text: String,
}

impl AnswerOption {
    /// 显示用的字母标签（A-D）
    pub fn label(&self) -> char {
        (b'A' + self.slot) as char
    }
}

/// 题目（不含答案）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// 由四个原始选项栏位构建题目，空选项被过滤
    pub fn from_slots(
        id: impl Into<String>,
        prompt: impl Into<String>,
        slots: [Option<String>; OPTION_SLOTS],
    ) -> Self {
        let options = slots
            .into_iter()
            .enumerate()
            .filter_map(|(slot, text)| {
                text.filter(|t| !t.trim().is_empty())
                    .map(|text| AnswerOption {
                        slot: slot as u8,
                        text,
                    })
            })
            .collect();

        Self {
            id: id.into(),
            prompt: prompt.into(),
            options,
        }
    }

    pub fn has_slot(&self, slot: u8) -> bool {
        self.options.iter().any(|o| o.slot == slot)
    }
}

/// 答案记录，仅在判分时单独获取
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey {
    pub question_id: String,
    pub correct_answer: String,
    pub options: [Option<String>; OPTION_SLOTS],
}

impl AnswerKey {
    /// 将栏位转换为选项文本
    pub fn option_text(&self, slot: u8) -> Option<&str> {
        self.options
            .get(slot as usize)
            .and_then(|o| o.as_deref())
    }

    /// 按文本严格比较判断对错，返回 (所选文本, 是否正确)
    pub fn judge(&self, slot: u8) -> (String, bool) {
        match self.option_text(slot) {
            Some(text) => (text.to_string(), text == self.correct_answer),
            None => (String::new(), false),
        }
    }
}

/// 考试状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamStatus {
    Active,
    Inactive,
    Other(String),
}

impl ExamStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => ExamStatus::Active,
            "inactive" => ExamStatus::Inactive,
            _ => ExamStatus::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamStatus::Active => write!(f, "active"),
            ExamStatus::Inactive => write!(f, "inactive"),
            ExamStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// 考试元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamMeta {
    pub id: String,
    pub name: String,
    /// 原始时长值，单位需按阈值规则判断
    pub duration_raw: u64,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub status: ExamStatus,
}

/// 考试会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    TimeExpired,
    Submitting,
    Submitted,
    Terminated,
    Error,
}

impl SessionStatus {
    /// 终态：不再允许任何修改
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Submitted | SessionStatus::Terminated)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Running => "Running",
            SessionStatus::TimeExpired => "TimeExpired",
            SessionStatus::Submitting => "Submitting",
            SessionStatus::Submitted => "Submitted",
            SessionStatus::Terminated => "Terminated",
            SessionStatus::Error => "Error",
        };
        f.write_str(name)
    }
}

/// 反序列化 ID，兼容字符串和整数两种格式
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(a: &str, b: &str, c: &str, d: &str) -> [Option<String>; OPTION_SLOTS] {
        [a, b, c, d].map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
    }

    #[test]
    fn empty_option_slots_are_filtered_without_renumbering() {
        let question = Question::from_slots("q1", "2 + 2 = ?", slots("3", "", "4", "  "));
        assert_eq!(question.options.len(), 2);
        assert_eq!(question.options[1].slot, 2);
        assert_eq!(question.options[1].label(), 'C');
        assert!(question.has_slot(2));
        assert!(!question.has_slot(1));
    }

    #[test]
    fn answer_key_compares_by_text() {
        let key = AnswerKey {
            question_id: "q1".into(),
            correct_answer: "4".into(),
            options: slots("3", "", "4", ""),
        };
        assert_eq!(key.judge(2), ("4".to_string(), true));
        assert_eq!(key.judge(0), ("3".to_string(), false));
        assert_eq!(key.judge(1), (String::new(), false));
        assert_eq!(key.judge(9), (String::new(), false));
    }

    #[test]
    fn id_accepts_string_or_number() {
        #[derive(serde::Deserialize)]
        struct Row {
            #[serde(deserialize_with = "deserialize_id")]
            id: String,
        }
        let a: Row = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        let b: Row = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(a.id, "42");
        assert_eq!(b.id, "abc");
    }
}
