//! 考试开放时间判断 - 业务能力层

use chrono::NaiveTime;

use crate::models::ExamMeta;

/// 考试在某一时刻的开放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    AvailableNow,
    Upcoming,
    Expired,
}

/// 按每日时间段判断考试是否开放，缺失的边界视为不限
pub fn availability(meta: &ExamMeta, now: NaiveTime) -> Availability {
    if let Some(start) = meta.start_time {
        if start > now {
            return Availability::Upcoming;
        }
    }
    if let Some(end) = meta.end_time {
        if end < now {
            return Availability::Expired;
        }
    }
    Availability::AvailableNow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExamStatus;

    fn meta(start: Option<(u32, u32)>, end: Option<(u32, u32)>) -> ExamMeta {
        let t = |(h, m): (u32, u32)| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        ExamMeta {
            id: "e1".into(),
            name: "期末".into(),
            duration_raw: 60,
            start_time: start.map(t),
            end_time: end.map(t),
            status: ExamStatus::Active,
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let exam = meta(Some((9, 0)), Some((11, 0)));
        assert_eq!(availability(&exam, at(9, 0)), Availability::AvailableNow);
        assert_eq!(availability(&exam, at(11, 0)), Availability::AvailableNow);
        assert_eq!(availability(&exam, at(8, 59)), Availability::Upcoming);
        assert_eq!(availability(&exam, at(11, 1)), Availability::Expired);
    }

    #[test]
    fn missing_bounds_are_open() {
        assert_eq!(
            availability(&meta(None, None), at(3, 0)),
            Availability::AvailableNow
        );
        assert_eq!(
            availability(&meta(None, Some((10, 0))), at(12, 0)),
            Availability::Expired
        );
    }
}
