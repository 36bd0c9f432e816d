/// 题库 REST 客户端
///
/// 封装所有与 PostgREST 风格表接口相关的调用逻辑
use async_trait::async_trait;
use chrono::NaiveTime;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::RepositoryError;
use crate::infrastructure::ExamRepository;
use crate::models::{
    deserialize_id, AnswerKey, AnswerRecord, ExamMeta, ExamStatus, Question, ResultRecord,
};

/// 题库客户端
pub struct SupabaseRepository {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ExamRow {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    name: String,
    duration: u64,
    start_time: Option<String>,
    end_time: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionRow {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    question_text: String,
    option1: Option<String>,
    option2: Option<String>,
    option3: Option<String>,
    option4: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnswerKeyRow {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    correct_answer: String,
    option1: Option<String>,
    option2: Option<String>,
    option3: Option<String>,
    option4: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
}

/// 解析 `HH:MM:SS` 或 `HH:MM`
fn parse_time_of_day(raw: Option<&str>) -> Option<NaiveTime> {
    let raw = raw?.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

impl From<ExamRow> for ExamMeta {
    fn from(row: ExamRow) -> Self {
        ExamMeta {
            id: row.id,
            name: row.name,
            duration_raw: row.duration,
            start_time: parse_time_of_day(row.start_time.as_deref()),
            end_time: parse_time_of_day(row.end_time.as_deref()),
            status: row
                .status
                .as_deref()
                .map(ExamStatus::parse)
                .unwrap_or(ExamStatus::Active),
        }
    }
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question::from_slots(
            row.id,
            row.question_text,
            [row.option1, row.option2, row.option3, row.option4],
        )
    }
}

impl From<AnswerKeyRow> for AnswerKey {
    fn from(row: AnswerKeyRow) -> Self {
        AnswerKey {
            question_id: row.id,
            correct_answer: row.correct_answer,
            options: [row.option1, row.option2, row.option3, row.option4],
        }
    }
}

impl SupabaseRepository {
    /// 创建新的题库客户端
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.repository_base_url.trim_end_matches('/').to_string(),
            api_key: config.repository_api_key.clone(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn check(endpoint: &str, response: Response) -> Result<Response, RepositoryError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(RepositoryError::BadResponse {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }

    /// 查询表
    ///
    /// # 参数
    /// - `table`: 表名
    /// - `query`: 查询参数（select / 过滤条件）
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, RepositoryError> {
        debug!("查询表 {}: {:?}", table, query);
        let request = self.client.get(self.table_url(table)).query(query);
        let response = self.authorized(request).send().await?;
        let rows = Self::check(table, response)?.json::<Vec<T>>().await?;
        Ok(rows)
    }

    /// 插入一行
    async fn insert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<(), RepositoryError> {
        debug!("写入表 {}", table);
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(row);
        let response = self.authorized(request).send().await?;
        Self::check(table, response)?;
        Ok(())
    }
}

#[async_trait]
impl ExamRepository for SupabaseRepository {
    async fn get_exam_meta(&self, exam_id: &str) -> Result<ExamMeta, RepositoryError> {
        let rows: Vec<ExamRow> = self
            .select(
                "exams",
                &[
                    ("select", "id,name,duration,start_time,end_time,status".into()),
                    ("id", format!("eq.{}", exam_id)),
                ],
            )
            .await?;

        rows.into_iter()
            .next()
            .map(ExamMeta::from)
            .ok_or_else(|| RepositoryError::NotFound {
                what: format!("exam {}", exam_id),
            })
    }

    async fn list_questions(&self, exam_id: &str) -> Result<Vec<Question>, RepositoryError> {
        let rows: Vec<QuestionRow> = self
            .select(
                "questions",
                &[
                    ("select", "id,question_text,option1,option2,option3,option4".into()),
                    ("exam_id", format!("eq.{}", exam_id)),
                    ("order", "id.asc".into()),
                ],
            )
            .await?;

        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn get_answer_key(&self, question_id: &str) -> Result<AnswerKey, RepositoryError> {
        let rows: Vec<AnswerKeyRow> = self
            .select(
                "questions",
                &[
                    ("select", "id,correct_answer,option1,option2,option3,option4".into()),
                    ("id", format!("eq.{}", question_id)),
                ],
            )
            .await?;

        rows.into_iter()
            .next()
            .map(AnswerKey::from)
            .ok_or_else(|| RepositoryError::NotFound {
                what: format!("answer key {}", question_id),
            })
    }

    async fn save_answer(&self, record: &AnswerRecord) -> Result<(), RepositoryError> {
        self.insert("student_answers", record).await
    }

    async fn save_result(&self, record: &ResultRecord) -> Result<(), RepositoryError> {
        self.insert("exam_results", record).await
    }

    async fn has_result(&self, exam_id: &str, student_id: &str) -> Result<bool, RepositoryError> {
        let rows: Vec<IdRow> = self
            .select(
                "exam_results",
                &[
                    ("select", "id".into()),
                    ("exam_id", format!("eq.{}", exam_id)),
                    ("student_username", format!("eq.{}", student_id)),
                    ("limit", "1".into()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }
}
