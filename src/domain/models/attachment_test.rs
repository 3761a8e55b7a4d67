use std::io::Write;

use anyhow::Result;
use tempfile::NamedTempFile;
use tempfile::TempDir;

use super::Attachment;
use crate::domain::models::AgentError;

#[tokio::test]
async fn it_reads_a_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"quarterly numbers")?;
    let path = file.path().to_string_lossy().to_string();

    let (attachment, bytes) = Attachment::read(&path).await?;

    assert_eq!(bytes, b"quarterly numbers".to_vec());
    assert_eq!(attachment.byte_size, 17);
    assert_eq!(
        attachment.file_name,
        file.path().file_name().unwrap().to_string_lossy()
    );
    assert!(attachment.remote_file_id.is_none());

    return Ok(());
}

#[tokio::test]
async fn it_rejects_missing_files() {
    let err = Attachment::read("./does/not/exist.pdf").await.unwrap_err();

    assert_eq!(
        err,
        AgentError::Validation("No file found at ./does/not/exist.pdf".to_string())
    );
}

#[tokio::test]
async fn it_rejects_empty_files() -> Result<()> {
    let file = NamedTempFile::new()?;
    let path = file.path().to_string_lossy().to_string();

    let err = Attachment::read(&path).await.unwrap_err();
    assert_eq!(err, AgentError::Validation(format!("{path} is empty")));

    return Ok(());
}

#[tokio::test]
async fn it_rejects_directories() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().to_string_lossy().to_string();

    let err = Attachment::read(&path).await.unwrap_err();
    assert_eq!(err, AgentError::Validation(format!("{path} is not a file")));

    return Ok(());
}

#[test]
fn it_builds_a_notice_after_upload() {
    let attachment = Attachment {
        local_path: "./report.pdf".into(),
        file_name: "report.pdf".to_string(),
        byte_size: 2048,
        remote_file_id: Some("assistant-file-1".to_string()),
    };

    insta::assert_snapshot!(attachment.notice(), @"I've uploaded a file named 'report.pdf' (2048 bytes). Its file id is assistant-file-1. Please take it into account when answering my next questions.");
}

#[test]
fn it_builds_a_notice_without_file_id() {
    let attachment = Attachment {
        local_path: "./notes.txt".into(),
        file_name: "notes.txt".to_string(),
        byte_size: 12,
        remote_file_id: None,
    };

    insta::assert_snapshot!(attachment.notice(), @"I've uploaded a file named 'notes.txt' (12 bytes). Please take it into account when answering my next questions.");
}
