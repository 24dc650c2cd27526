//! S3 适配器：基于 aws-sdk-s3 的简化实现，支持大对象的分段上传、基础重试与校验。

use super::client::ObjectBackend;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use md5;
use std::sync::Arc;
use tokio::{
    sync::Semaphore,
    time::{Duration, sleep},
};

/// S3 后端配置选项
#[derive(Debug, Clone)]
pub struct S3Config {
    /// 目标桶
    pub bucket: String,
    /// 自定义 endpoint（MinIO 等兼容实现）；None 走默认解析
    pub endpoint_url: Option<String>,
    pub region: String,
    /// 分段大小（字节），建议 8-64MiB
    pub part_size: usize,
    /// 最大并发分段上传数
    pub max_concurrency: usize,
    /// 最大重试次数
    pub max_retries: u32,
    /// 初始重试延迟（毫秒）
    pub initial_retry_delay_ms: u64,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "main".to_string(),
            endpoint_url: None,
            region: "us-east-1".to_string(),
            part_size: 8 * 1024 * 1024, // 8MB
            max_concurrency: 8,
            max_retries: 3,
            initial_retry_delay_ms: 100,
        }
    }
}

pub struct S3Backend {
    client: Client,
    config: S3Config,
}

impl S3Backend {
    pub async fn new(config: S3Config) -> anyhow::Result<Self> {
        let mut loader = aws_config::ConfigLoader::default()
            .credentials_provider(
                aws_config::environment::EnvironmentVariableCredentialsProvider::new(),
            )
            .region(aws_config::Region::new(config.region.clone()));
        if let Some(url) = &config.endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let conf = loader.load().await;
        Ok(Self {
            client: Client::new(&conf),
            config,
        })
    }

    fn md5_base64(data: &[u8]) -> String {
        let sum = md5::compute(data);
        B64.encode(sum.0)
    }

    async fn execute_with_retry<T, F, Fut, E>(
        &self,
        operation: F,
        operation_name: &'static str,
    ) -> anyhow::Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        let mut attempt = 0;
        let max_retries = self.config.max_retries;
        loop {
            attempt += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if attempt > max_retries {
                        return Err(anyhow::anyhow!(
                            "{operation_name} failed after {max_retries} attempts: {e}"
                        ));
                    }

                    let delay_ms = self.config.initial_retry_delay_ms * 2u64.pow(attempt - 1);
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn put_object_simple(&self, key: &str, data: &[u8]) -> anyhow::Result<()> {
        let checksum = Self::md5_base64(data);
        let operation = || async {
            self.client
                .put_object()
                .bucket(&self.config.bucket)
                .key(key)
                .content_md5(checksum.clone())
                .body(data.to_owned().into())
                .send()
                .await
        };
        self.execute_with_retry(operation, "put_object")
            .await
            .map(|_| ())
    }

    async fn upload_part(
        &self,
        key: String,
        upload_id: String,
        part_number: i32,
        data: Vec<u8>,
        semaphore: Arc<Semaphore>,
    ) -> anyhow::Result<(i32, Option<String>)> {
        let _permit = semaphore
            .acquire()
            .await
            .map_err(|e| anyhow::anyhow!("upload semaphore closed: {e}"))?;
        let checksum = Self::md5_base64(&data);

        let operation = || async {
            self.client
                .upload_part()
                .bucket(&self.config.bucket)
                .key(&key)
                .upload_id(&upload_id)
                .part_number(part_number)
                .content_md5(checksum.clone())
                .body(data.clone().into())
                .send()
                .await
        };

        self.execute_with_retry(operation, "upload_part")
            .await
            .map(|resp| (part_number, resp.e_tag().map(|s| s.to_string())))
    }

    async fn multipart_upload(&self, key: &str, data: &[u8]) -> anyhow::Result<()> {
        let create = self
            .client
            .create_multipart_upload()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await?;
        let upload_id = create.upload_id().unwrap_or_default().to_string();
        let sem = Arc::new(Semaphore::new(self.config.max_concurrency));

        let mut parts = Vec::new();
        let total = data.len();
        let mut idx = 0usize;
        let mut part_number = 1i32;

        while idx < total {
            let end = (idx + self.config.part_size).min(total);
            let chunk = data[idx..end].to_vec();
            parts.push(self.upload_part(
                key.to_string(),
                upload_id.clone(),
                part_number,
                chunk,
                sem.clone(),
            ));
            idx = end;
            part_number += 1;
        }

        let results = match futures::future::try_join_all(parts).await {
            Ok(v) => v,
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.config.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!(key, error = %abort_err, "failed to abort multipart upload");
                }
                return Err(e);
            }
        };

        let completed_parts = results
            .into_iter()
            .map(|(pn, etag)| {
                CompletedPart::builder()
                    .part_number(pn)
                    .set_e_tag(etag)
                    .build()
            })
            .collect::<Vec<_>>();

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.config.bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn put_object(&self, key: &str, data: &[u8]) -> anyhow::Result<()> {
        // 小对象直接 put_object；大对象走 multipart。
        if data.len() <= self.config.part_size {
            return self.put_object_simple(key, data).await;
        }
        self.multipart_upload(key, data).await
    }

    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await;
        match resp {
            Ok(o) => {
                use tokio::io::AsyncReadExt;
                let mut body = o.body.into_async_read();
                let mut buf = Vec::new();
                body.read_to_end(&mut buf).await?;
                Ok(Some(buf))
            }
            Err(e) => {
                // 简化：NoSuchKey 返回 None，其他错误返回 Err
                let msg = format!("{e}");
                if msg.contains("NoSuchKey") || msg.contains("NotFound") {
                    Ok(None)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn is_exist(&self, key: &str) -> anyhow::Result<bool> {
        let resp = self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await;
        match resp {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().map(|se| se.is_not_found()).unwrap_or(false) {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }
}
