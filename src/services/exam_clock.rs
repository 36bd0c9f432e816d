//! 考试计时 - 业务能力层
//!
//! 时长单位判断和倒计时显示

use crate::infrastructure::CountdownView;

/// 将原始时长换算为秒
///
/// 大于 `threshold` 时视为已经是秒，否则视为旧格式的分钟。
/// 该规则无法区分 5~300 分钟的考试和同等数值的秒数，需要数据源提供明确的单位字段才能消除歧义
pub fn resolve_duration_seconds(raw: u64, threshold: u64) -> u64 {
    if raw > threshold {
        raw
    } else {
        raw.saturating_mul(60)
    }
}

/// 格式化为 `MM:SS`，分钟可超过 59
pub fn format_remaining(remaining_secs: u64) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

pub fn countdown_view(remaining_secs: u64, low_time_warning_secs: u64) -> CountdownView {
    CountdownView {
        remaining_secs,
        text: format_remaining(remaining_secs),
        is_low: remaining_secs < low_time_warning_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_are_minutes_large_values_are_seconds() {
        assert_eq!(resolve_duration_seconds(30, 300), 1800);
        assert_eq!(resolve_duration_seconds(1800, 300), 1800);
        assert_eq!(resolve_duration_seconds(300, 300), 18000);
        assert_eq!(resolve_duration_seconds(301, 300), 301);
        assert_eq!(resolve_duration_seconds(0, 300), 0);
    }

    #[test]
    fn threshold_is_configurable() {
        assert_eq!(resolve_duration_seconds(100, 60), 100);
        assert_eq!(resolve_duration_seconds(60, 60), 3600);
    }

    #[test]
    fn remaining_time_formats_as_minutes_and_seconds() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(65), "01:05");
        assert_eq!(format_remaining(7200), "120:00");
    }

    #[test]
    fn countdown_is_low_under_threshold() {
        assert!(!countdown_view(300, 300).is_low);
        assert!(countdown_view(299, 300).is_low);
    }
}
