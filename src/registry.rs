//! FUR 注册中心 HTTP 客户端

use crate::error::{FurError, Result};
use crate::package_manager::{PackageList, PackageMetadata};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// 安装流程需要的注册中心操作
#[allow(async_fn_in_trait)]
pub trait Registry {
    /// 获取包元数据，包不存在时返回 `Ok(None)`
    async fn fetch_metadata(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Option<PackageMetadata>>;

    /// 记录一次下载；调用方忽略失败
    async fn report_download(&self, name: &str) -> Result<()>;
}

pub struct RegistryClient {
    client: Client,
    repositories: Vec<String>,
}

impl RegistryClient {
    pub fn new(repositories: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FurError::Network {
                url: String::new(),
                source,
            })?;
        let repositories = repositories
            .into_iter()
            .map(|r| r.trim_end_matches('/').to_string())
            .filter(|r| !r.is_empty())
            .collect();
        Ok(Self {
            client,
            repositories,
        })
    }

    fn primary(&self) -> Result<&str> {
        self.repositories
            .first()
            .map(String::as_str)
            .ok_or(FurError::NoRepository)
    }

    /// GET 并解析 JSON；404 返回 `Ok(None)`
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        log::debug!("请求: {} {:?}", url, query);
        let network = |source| FurError::Network {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FurError::Registry {
                url: url.to_string(),
                status,
            });
        }

        // 响应体无法解析说明服务端返回了错误格式，不是连接问题
        let body = response.text().await.map_err(network)?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// 搜索包
    pub async fn search(&self, query: &str) -> Result<PackageList> {
        let url = packages_url(self.primary()?);
        Ok(self
            .get_json(&url, &[("search", query)])
            .await?
            .unwrap_or_default())
    }

    /// 列出所有包，可按 `sort` 排序（如 mostDownloads、recentlyUpdated）
    pub async fn list(&self, sort: Option<&str>) -> Result<PackageList> {
        let url = packages_url(self.primary()?);
        let query: Vec<(&str, &str)> = sort
            .filter(|s| !s.is_empty())
            .map(|s| vec![("sort", s)])
            .unwrap_or_default();
        Ok(self.get_json(&url, &query).await?.unwrap_or_default())
    }
}

impl Registry for RegistryClient {
    async fn fetch_metadata(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Option<PackageMetadata>> {
        if self.repositories.is_empty() {
            return Err(FurError::NoRepository);
        }
        // 空包名会落到列表接口上
        if name.trim().is_empty() {
            return Ok(None);
        }

        // 按配置顺序尝试各个仓库，第一个找到的为准
        let mut unreachable = None;
        let mut answered = false;
        for base in &self.repositories {
            let url = package_url(base, name, version);
            match self.get_json::<PackageMetadata>(&url, &[]).await {
                Ok(Some(meta)) => return Ok(Some(meta)),
                Ok(None) => answered = true,
                Err(e @ FurError::Network { .. }) => {
                    log::warn!("仓库 {} 不可用: {}", base, e);
                    unreachable = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        match unreachable {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }

    async fn report_download(&self, name: &str) -> Result<()> {
        let url = format!("{}/{}/download", packages_url(self.primary()?), name);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|source| FurError::Network {
                url: url.clone(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(FurError::Registry {
                url,
                status: response.status(),
            });
        }
        Ok(())
    }
}

fn packages_url(base: &str) -> String {
    format!("{}/api/v1/packages", base)
}

fn package_url(base: &str, name: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{}/{}/{}", packages_url(base), name, v),
        None => format!("{}/{}", packages_url(base), name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 按请求行前缀返回预设响应的最小 HTTP 服务
    async fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let request_line = request.lines().next().unwrap_or_default().to_string();

                let (status, body) = routes
                    .iter()
                    .find(|(prefix, _, _)| request_line.starts_with(prefix))
                    .map(|(_, status, body)| (*status, *body))
                    .unwrap_or((404, ""));
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    fn client(repositories: Vec<String>) -> RegistryClient {
        RegistryClient::new(repositories, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn builds_package_urls() {
        assert_eq!(
            package_url("http://r", "hello", None),
            "http://r/api/v1/packages/hello"
        );
        assert_eq!(
            package_url("http://r", "hello", Some("1.0")),
            "http://r/api/v1/packages/hello/1.0"
        );
    }

    #[tokio::test]
    async fn fetches_metadata() {
        let base = serve(vec![(
            "GET /api/v1/packages/hello/1.0 ",
            200,
            r#"{"name":"hello","version":"1.0","git":"https://e/hello.git","dependencies":["world"]}"#,
        )])
        .await;

        let meta = client(vec![base])
            .fetch_metadata("hello", Some("1.0"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(meta.version, "1.0");
        assert_eq!(meta.dependencies, vec!["world".to_string()]);
    }

    #[tokio::test]
    async fn missing_package_is_none() {
        let base = serve(vec![]).await;
        let meta = client(vec![base]).fetch_metadata("ghost", None).await.unwrap();
        assert!(meta.is_none());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let base = serve(vec![("GET /api/v1/packages/hello ", 500, "")]).await;
        let err = client(vec![base]).fetch_metadata("hello", None).await.unwrap_err();
        assert!(matches!(err, FurError::Registry { .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_not_treated_as_unreachable() {
        let broken = serve(vec![("GET /api/v1/packages/hello ", 200, "<html>oops</html>")]).await;
        let good = serve(vec![("GET /api/v1/packages/hello ", 200, r#"{"name":"hello"}"#)]).await;

        let err = client(vec![broken, good])
            .fetch_metadata("hello", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FurError::Json(_)));
    }

    #[tokio::test]
    async fn empty_name_never_hits_list_endpoint() {
        let base = serve(vec![(
            "GET /api/v1/packages",
            200,
            r#"{"packages":["hello"],"packageCount":1}"#,
        )])
        .await;

        let meta = client(vec![base]).fetch_metadata(" ", Some("1.0")).await.unwrap();
        assert!(meta.is_none());
    }

    #[tokio::test]
    async fn unreachable_repository_falls_through_to_next() {
        let closed = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };
        let base = serve(vec![("GET /api/v1/packages/hello ", 200, r#"{"name":"hello"}"#)]).await;

        let registry = client(vec![closed.clone(), base]);
        assert!(registry.fetch_metadata("hello", None).await.unwrap().is_some());

        let err = client(vec![closed]).fetch_metadata("hello", None).await.unwrap_err();
        assert!(matches!(err, FurError::Network { .. }));
    }

    #[tokio::test]
    async fn no_repositories_configured() {
        let err = client(vec![String::new()])
            .fetch_metadata("hello", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FurError::NoRepository));
    }

    #[tokio::test]
    async fn search_sends_query() {
        let base = serve(vec![(
            "GET /api/v1/packages?search=hello+world ",
            200,
            r#"{"packages":["hello-world"],"packageCount":1}"#,
        )])
        .await;

        let list = client(vec![base]).search("hello world").await.unwrap();
        assert_eq!(list.packages, vec!["hello-world".to_string()]);
        assert_eq!(list.package_count, 1);
    }

    #[tokio::test]
    async fn download_failure_is_an_error_value() {
        let base = serve(vec![]).await;
        assert!(client(vec![base]).report_download("hello").await.is_err());
    }
}
