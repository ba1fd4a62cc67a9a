//! Glacier client backed by the AWS SDK

use super::traits::{GlacierApi, InventoryJobRequest};
use crate::config::Config;
use crate::error::{Error, ParseError, ServiceError};
use crate::types::{
    INVENTORY_FORMAT, INVENTORY_RETRIEVAL, JobAction, JobStatus, RetrievalJob, VaultSummary,
};
use async_trait::async_trait;
use aws_sdk_glacier::Client;
use aws_sdk_glacier::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_glacier::operation::describe_job::DescribeJobOutput;
use aws_sdk_glacier::types::{
    ActionCode, DescribeVaultOutput, GlacierJobDescription, JobParameters, StatusCode,
};
use chrono::{DateTime, Utc};

/// [`GlacierApi`] implementation over [`aws_sdk_glacier::Client`]
///
/// The client is region-scoped; build one per region.
#[derive(Clone, Debug)]
pub struct SdkGlacier {
    client: Client,
}

impl SdkGlacier {
    /// Wrap an existing SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Validate `config` and build a client from the shared AWS configuration
    pub async fn from_config(config: &Config) -> crate::Result<Self> {
        config.validate()?;
        let sdk_config = config.load_sdk_config().await;
        tracing::debug!(
            region = ?sdk_config.region(),
            max_attempts = config.max_attempts,
            "Created Glacier client"
        );
        Ok(Self::new(Client::new(&sdk_config)))
    }

    /// The underlying SDK client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl GlacierApi for SdkGlacier {
    async fn list_vaults(&self, account_id: &str) -> crate::Result<Vec<VaultSummary>> {
        let mut vaults = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_vaults()
                .account_id(account_id)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| service_error("ListVaults", e))?;

            for vault in output.vault_list() {
                vaults.push(vault_summary(vault)?);
            }

            match output.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(vaults)
    }

    async fn list_jobs(
        &self,
        account_id: &str,
        vault_name: &str,
    ) -> crate::Result<Vec<RetrievalJob>> {
        let mut jobs = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_jobs()
                .account_id(account_id)
                .vault_name(vault_name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| service_error("ListJobs", e))?;

            for job in output.job_list() {
                jobs.push(JobFields::from(job).into_job("ListJobs", account_id, vault_name)?);
            }

            match output.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(jobs)
    }

    async fn initiate_job(
        &self,
        account_id: &str,
        vault_name: &str,
        request: &InventoryJobRequest,
    ) -> crate::Result<String> {
        let parameters = JobParameters::builder()
            .r#type(INVENTORY_RETRIEVAL)
            .format(INVENTORY_FORMAT)
            .set_description(request.description.clone())
            .set_sns_topic(request.sns_topic.clone())
            .build();

        let output = self
            .client
            .initiate_job()
            .account_id(account_id)
            .vault_name(vault_name)
            .job_parameters(parameters)
            .send()
            .await
            .map_err(|e| service_error("InitiateJob", e))?;

        output.job_id().map(str::to_string).ok_or_else(|| {
            ParseError::MissingField {
                operation: "InitiateJob",
                field: "JobId",
            }
            .into()
        })
    }

    async fn describe_job(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> crate::Result<RetrievalJob> {
        let output = self
            .client
            .describe_job()
            .account_id(account_id)
            .vault_name(vault_name)
            .job_id(job_id)
            .send()
            .await
            .map_err(|e| service_error("DescribeJob", e))?;

        JobFields::from(&output).into_job("DescribeJob", account_id, vault_name)
    }

    async fn get_job_output(
        &self,
        account_id: &str,
        vault_name: &str,
        job_id: &str,
    ) -> crate::Result<Vec<u8>> {
        let output = self
            .client
            .get_job_output()
            .account_id(account_id)
            .vault_name(vault_name)
            .job_id(job_id)
            .send()
            .await
            .map_err(|e| service_error("GetJobOutput", e))?;

        let body = output.body.collect().await.map_err(|e| {
            ServiceError::new("GetJobOutput", format!("failed to read job output: {e}"))
        })?;

        Ok(body.into_bytes().to_vec())
    }

    async fn delete_archive(
        &self,
        account_id: &str,
        vault_name: &str,
        archive_id: &str,
    ) -> crate::Result<()> {
        self.client
            .delete_archive()
            .account_id(account_id)
            .vault_name(vault_name)
            .archive_id(archive_id)
            .send()
            .await
            .map_err(|e| service_error("DeleteArchive", e))?;
        Ok(())
    }

    async fn delete_vault(&self, account_id: &str, vault_name: &str) -> crate::Result<()> {
        self.client
            .delete_vault()
            .account_id(account_id)
            .vault_name(vault_name)
            .send()
            .await
            .map_err(|e| service_error("DeleteVault", e))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "aws-sdk"
    }
}

/// Convert an SDK failure into a [`ServiceError`], keeping the service error code
fn service_error<E>(operation: &'static str, err: SdkError<E>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    ServiceError {
        operation,
        code,
        message,
    }
    .into()
}

/// The job fields shared by ListJobs entries and DescribeJob responses
struct JobFields<'a> {
    job_id: Option<&'a str>,
    vault_arn: Option<&'a str>,
    action: Option<&'a ActionCode>,
    creation_date: Option<&'a str>,
    completion_date: Option<&'a str>,
    status_code: Option<&'a StatusCode>,
    status_message: Option<&'a str>,
}

impl<'a> From<&'a GlacierJobDescription> for JobFields<'a> {
    fn from(job: &'a GlacierJobDescription) -> Self {
        Self {
            job_id: job.job_id(),
            vault_arn: job.vault_arn(),
            action: job.action(),
            creation_date: job.creation_date(),
            completion_date: job.completion_date(),
            status_code: job.status_code(),
            status_message: job.status_message(),
        }
    }
}

impl<'a> From<&'a DescribeJobOutput> for JobFields<'a> {
    fn from(job: &'a DescribeJobOutput) -> Self {
        Self {
            job_id: job.job_id(),
            vault_arn: job.vault_arn(),
            action: job.action(),
            creation_date: job.creation_date(),
            completion_date: job.completion_date(),
            status_code: job.status_code(),
            status_message: job.status_message(),
        }
    }
}

impl JobFields<'_> {
    fn into_job(
        self,
        operation: &'static str,
        account_id: &str,
        vault_name: &str,
    ) -> crate::Result<RetrievalJob> {
        let missing = |field| ParseError::MissingField { operation, field };

        let job_id = self.job_id.ok_or_else(|| missing("JobId"))?;
        let creation_date = self.creation_date.ok_or_else(|| missing("CreationDate"))?;
        let status = self
            .status_code
            .and_then(|code| JobStatus::from_code(code.as_str()))
            .ok_or_else(|| missing("StatusCode"))?;
        let action = self
            .action
            .map(|code| JobAction::from_code(code.as_str()))
            .ok_or_else(|| missing("Action"))?;

        Ok(RetrievalJob {
            job_id: job_id.to_string(),
            vault_name: vault_name.to_string(),
            account_id: account_id.to_string(),
            vault_arn: self.vault_arn.map(str::to_string),
            action,
            creation_date: parse_timestamp("CreationDate", creation_date)?,
            completion_date: self
                .completion_date
                .map(|date| parse_timestamp("CompletionDate", date))
                .transpose()?,
            status,
            status_message: self.status_message.map(str::to_string),
        })
    }
}

fn vault_summary(vault: &DescribeVaultOutput) -> crate::Result<VaultSummary> {
    let vault_name = vault.vault_name().ok_or(ParseError::MissingField {
        operation: "ListVaults",
        field: "VaultName",
    })?;

    Ok(VaultSummary {
        vault_name: vault_name.to_string(),
        vault_arn: vault.vault_arn().map(str::to_string),
        number_of_archives: vault.number_of_archives(),
        size_in_bytes: vault.size_in_bytes(),
        creation_date: vault
            .creation_date()
            .map(|date| parse_timestamp("CreationDate", date))
            .transpose()?,
        last_inventory_date: vault
            .last_inventory_date()
            .map(|date| parse_timestamp("LastInventoryDate", date))
            .transpose()?,
    })
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|source| ParseError::InvalidTimestamp {
            field,
            value: value.to_string(),
            source,
        })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_glacier::error::ErrorMetadata;
    use aws_sdk_glacier::operation::delete_archive::{DeleteArchiveError, DeleteArchiveOutput};
    use aws_sdk_glacier::operation::describe_job::DescribeJobError;
    use aws_sdk_glacier::operation::get_job_output::GetJobOutputOutput;
    use aws_sdk_glacier::operation::initiate_job::InitiateJobOutput;
    use aws_sdk_glacier::operation::list_jobs::ListJobsOutput;
    use aws_sdk_glacier::operation::list_vaults::ListVaultsOutput;
    use aws_sdk_glacier::primitives::ByteStream;
    use aws_sdk_glacier::types::error::{ResourceNotFoundException, ServiceUnavailableException};
    use aws_smithy_mocks::{mock, mock_client};

    const INVENTORY: &[u8] = br#"{"VaultARN":"arn:aws:glacier:us-east-1:012345678901:vaults/v","InventoryDate":"2024-05-01T00:00:00Z","ArchiveList":[]}"#;

    fn job(id: &str, created: &str, status: StatusCode) -> GlacierJobDescription {
        GlacierJobDescription::builder()
            .job_id(id)
            .action(ActionCode::InventoryRetrieval)
            .vault_arn("arn:aws:glacier:us-east-1:012345678901:vaults/v")
            .creation_date(created)
            .status_code(status)
            .build()
    }

    #[tokio::test]
    async fn test_list_jobs_follows_markers() {
        let rule = mock!(aws_sdk_glacier::Client::list_jobs)
            .sequence()
            .output(|| {
                ListJobsOutput::builder()
                    .job_list(job("J1", "2024-05-01T10:00:00.000Z", StatusCode::Succeeded))
                    .marker("page-2")
                    .build()
            })
            .output(|| {
                ListJobsOutput::builder()
                    .job_list(job("J2", "2024-05-02T10:00:00.000Z", StatusCode::InProgress))
                    .build()
            })
            .build();
        let glacier = SdkGlacier::new(mock_client!(aws_sdk_glacier, [&rule]));

        let jobs = glacier.list_jobs("-", "v").await.unwrap();

        assert_eq!(rule.num_calls(), 2);
        let ids: Vec<_> = jobs.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["J1", "J2"]);
        assert_eq!(jobs[0].status, JobStatus::Succeeded);
        assert_eq!(jobs[1].status, JobStatus::InProgress);
        assert_eq!(jobs[0].action, JobAction::InventoryRetrieval);
        assert_eq!(jobs[0].vault_name, "v");
    }

    #[tokio::test]
    async fn test_list_jobs_empty_is_not_an_error() {
        let rule = mock!(aws_sdk_glacier::Client::list_jobs)
            .then_output(|| ListJobsOutput::builder().build());
        let glacier = SdkGlacier::new(mock_client!(aws_sdk_glacier, [&rule]));

        let jobs = glacier.list_jobs("-", "v").await.unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_list_jobs_rejects_bad_timestamp() {
        let rule = mock!(aws_sdk_glacier::Client::list_jobs).then_output(|| {
            ListJobsOutput::builder()
                .job_list(job("J1", "yesterday", StatusCode::Succeeded))
                .build()
        });
        let glacier = SdkGlacier::new(mock_client!(aws_sdk_glacier, [&rule]));

        let err = glacier.list_jobs("-", "v").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::InvalidTimestamp {
                field: "CreationDate",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_initiate_job_requests_json_inventory() {
        let rule = mock!(aws_sdk_glacier::Client::initiate_job)
            .match_requests(|req| {
                req.job_parameters().is_some_and(|p| {
                    p.r#type() == Some(INVENTORY_RETRIEVAL) && p.format() == Some(INVENTORY_FORMAT)
                })
            })
            .then_output(|| InitiateJobOutput::builder().job_id("J1").build());
        let glacier = SdkGlacier::new(mock_client!(aws_sdk_glacier, [&rule]));

        let job_id = glacier
            .initiate_job("-", "v", &InventoryJobRequest::default())
            .await
            .unwrap();
        assert_eq!(job_id, "J1");
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_describe_job_not_found_keeps_code() {
        let rule = mock!(aws_sdk_glacier::Client::describe_job).then_error(|| {
            DescribeJobError::ResourceNotFoundException(
                ResourceNotFoundException::builder()
                    .message("job does not exist")
                    .meta(
                        ErrorMetadata::builder()
                            .code("ResourceNotFoundException")
                            .message("job does not exist")
                            .build(),
                    )
                    .build(),
            )
        });
        let glacier = SdkGlacier::new(mock_client!(aws_sdk_glacier, [&rule]));

        let err = glacier.describe_job("-", "v", "missing").await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err:?}");
        match err {
            Error::Service(e) => assert_eq!(e.operation, "DescribeJob"),
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_job_output_reads_body() {
        let rule = mock!(aws_sdk_glacier::Client::get_job_output).then_output(|| {
            GetJobOutputOutput::builder()
                .body(ByteStream::from_static(INVENTORY))
                .build()
        });
        let glacier = SdkGlacier::new(mock_client!(aws_sdk_glacier, [&rule]));

        let body = glacier.get_job_output("-", "v", "J1").await.unwrap();
        assert_eq!(body, INVENTORY);
    }

    #[tokio::test]
    async fn test_delete_archive_maps_service_failure() {
        let ok = mock!(aws_sdk_glacier::Client::delete_archive)
            .match_requests(|req| req.archive_id() == Some("A1"))
            .then_output(|| DeleteArchiveOutput::builder().build());
        let failing = mock!(aws_sdk_glacier::Client::delete_archive)
            .match_requests(|req| req.archive_id() == Some("A2"))
            .then_error(|| {
                DeleteArchiveError::ServiceUnavailableException(
                    ServiceUnavailableException::builder()
                        .message("try again")
                        .build(),
                )
            });
        let glacier = SdkGlacier::new(mock_client!(
            aws_sdk_glacier,
            aws_smithy_mocks::RuleMode::MatchAny,
            [&ok, &failing]
        ));

        glacier.delete_archive("-", "v", "A1").await.unwrap();
        let err = glacier.delete_archive("-", "v", "A2").await.unwrap_err();
        assert!(matches!(err, Error::Service(ref e) if e.operation == "DeleteArchive"));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_vaults_maps_summaries() {
        let rule = mock!(aws_sdk_glacier::Client::list_vaults).then_output(|| {
            ListVaultsOutput::builder()
                .vault_list(
                    DescribeVaultOutput::builder()
                        .vault_name("photos")
                        .vault_arn("arn:aws:glacier:us-east-1:012345678901:vaults/photos")
                        .creation_date("2020-01-01T00:00:00.000Z")
                        .number_of_archives(3)
                        .size_in_bytes(3072)
                        .build(),
                )
                .build()
        });
        let glacier = SdkGlacier::new(mock_client!(aws_sdk_glacier, [&rule]));

        let vaults = glacier.list_vaults("-").await.unwrap();
        assert_eq!(vaults.len(), 1);
        assert_eq!(vaults[0].vault_name, "photos");
        assert_eq!(vaults[0].number_of_archives, 3);
        assert_eq!(vaults[0].size_in_bytes, 3072);
        assert!(vaults[0].creation_date.is_some());
        assert!(vaults[0].last_inventory_date.is_none());
    }

    #[test]
    fn test_parse_timestamp_accepts_service_format() {
        let date = parse_timestamp("CreationDate", "2012-03-20T17:03:43.221Z").unwrap();
        assert_eq!(date.to_rfc3339(), "2012-03-20T17:03:43.221+00:00");
    }
}
