use crate::{
    cli::{actions::report, globals::GlobalArgs},
    forum::{api::ImageUpload, validate, Composer, PostForm},
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct PostArgs {
    pub globals: GlobalArgs,
    pub title: String,
    pub content: String,
    pub image: Option<PathBuf>,
}

#[derive(Debug)]
pub struct DraftArgs {
    pub globals: GlobalArgs,
    pub title: String,
}

#[derive(Debug)]
pub struct CommentArgs {
    pub globals: GlobalArgs,
    pub post_id: u64,
    pub content: String,
}

/// Reads an image the way a file picker hands it over: bytes plus a type
/// inferred from the extension. Unsupported types are left to the form checks.
async fn load_image(path: &Path) -> Result<ImageUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = validate::image_mime(&file_name).unwrap_or("application/octet-stream");

    Ok(ImageUpload {
        mime: mime.to_string(),
        file_name,
        bytes,
    })
}

/// # Errors
/// Returns an error if the image cannot be read or the post is rejected.
pub async fn post(args: PostArgs) -> Result<()> {
    let image = match &args.image {
        Some(path) => Some(load_image(path).await?),
        None => None,
    };

    let composer = Composer::new(args.globals.api()?);
    let form = PostForm {
        title: args.title,
        content: args.content,
        image,
    };
    let redirect = composer.create_post(&form).await.map_err(report)?;

    println!("post published, continue at {}", redirect.target);

    Ok(())
}

/// # Errors
/// Returns an error if the title is invalid or nothing was generated.
pub async fn draft(args: DraftArgs) -> Result<()> {
    let composer = Composer::new(args.globals.api()?);
    let content = composer.draft(&args.title).await.map_err(report)?;

    println!("{content}");

    Ok(())
}

/// # Errors
/// Returns an error if the comment is invalid or rejected.
pub async fn comment(args: CommentArgs) -> Result<()> {
    let composer = Composer::new(args.globals.api()?);
    let comment = composer
        .comment(args.post_id, &args.content)
        .await
        .map_err(report)?;

    let author = comment
        .author
        .as_ref()
        .map_or("you", |author| author.username.as_str());
    println!("comment #{} added by {author}", comment.id);

    Ok(())
}
