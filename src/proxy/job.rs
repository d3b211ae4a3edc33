use bytes::Bytes;
use serde_json::Value;

/// 一次上游请求任务，提交后不可变
#[derive(Debug, Clone)]
pub struct Job {
    pub req_id: String,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl Job {
    pub fn new(req_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            req_id: req_id.into(),
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// 由路径片段构建任务，片段按百分号编码
    pub fn for_segments(req_id: impl Into<String>, segments: &[&str]) -> Self {
        let path: String = segments
            .iter()
            .map(|segment| format!("/{}", encode_segment(segment)))
            .collect();
        Self::new(req_id, path)
    }

    /// 追加查询参数，`None` 不会出现在上游请求中
    pub fn with_param(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.params.push((name.to_string(), value.to_string()));
        }
        self
    }
}

fn encode_segment(segment: &str) -> String {
    segment
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect()
}

/// 任务结果：状态码与上游原始响应体
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub status: u16,
    pub content_type: Option<String>,
    pub data: Option<Bytes>,
}

impl JobResult {
    pub fn new(status: u16, content_type: Option<String>, data: Option<Bytes>) -> Self {
        Self {
            status,
            content_type,
            data,
        }
    }

    /// 本地生成的结果，没有响应体
    pub fn status_only(status: u16) -> Self {
        Self::new(status, None, None)
    }

    /// 本地限流或传输失败
    pub fn too_many_requests() -> Self {
        Self::status_only(429)
    }

    pub fn internal_error() -> Self {
        Self::status_only(500)
    }

    /// 响应体按 JSON 解析，不是 JSON 时返回 None
    pub fn json(&self) -> Option<Value> {
        self.data
            .as_ref()
            .and_then(|data| serde_json::from_slice(data).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_params_are_skipped() {
        let job = Job::new("req-1", "/api/user/1/tweets")
            .with_param("cursor", None)
            .with_param("limit", Some("20"));
        assert_eq!(job.params, vec![("limit".to_string(), "20".to_string())]);
    }

    #[test]
    fn segments_are_percent_encoded() {
        let job = Job::for_segments("req-1", &["api", "user", "a/b?c d"]);
        assert_eq!(job.path, "/api/user/a%2Fb%3Fc%20d");
        assert_eq!(Job::for_segments("r", &["api", "tweet", "1"]).path, "/api/tweet/1");
    }

    #[test]
    fn local_rejections_have_no_body() {
        assert_eq!(JobResult::too_many_requests(), JobResult::new(429, None, None));
        assert_eq!(JobResult::internal_error().data, None);
    }

    #[test]
    fn json_view_of_raw_body() {
        let ok = JobResult::new(
            200,
            Some("application/json".into()),
            Some(Bytes::from_static(br#"{"id":"1"}"#)),
        );
        assert_eq!(ok.json(), Some(serde_json::json!({"id": "1"})));

        let html = JobResult::new(404, None, Some(Bytes::from_static(b"<html>Not found</html>")));
        assert_eq!(html.json(), None);
        assert_eq!(html.data.as_deref(), Some(&b"<html>Not found</html>"[..]));
    }
}
