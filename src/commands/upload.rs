use std::path::Path;

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, Session, emit_notice, render_record};
use crate::cli::OutputOptions;
use crate::entity::{MediaCollection, MediaPost};
use crate::error::Result;
use crate::remote::MediaUpload;

/// Upload a file to the media library and report the stored post.
pub async fn cmd_upload(
    file: &Path,
    collection: Option<MediaCollection>,
    title: Option<String>,
    output: OutputOptions,
) -> Result<()> {
    let upload = MediaUpload::from_path(file, collection, title).await?;
    let file_name = upload.file_name.clone();
    let collection = upload.collection;

    let session = Session::authenticated()?;
    let controller = session.controller::<MediaPost>();
    let result = controller.upload(upload).await;
    let notice = controller.take_notice();
    let record = session.finish(result)?;

    emit_notice(notice, output);
    let mut text = format!("Uploaded {} to {}", file_name.cyan(), collection);
    if let Some(post) = &record {
        text.push('\n');
        text.push_str(&render_record(post));
    }
    CommandOutput::new(json!({
        "file": file_name,
        "collection": collection.to_string(),
        "post": record,
    }))
    .with_text(text)
    .print(output)
}
