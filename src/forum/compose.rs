//! Post creation, AI drafting and comments. All three share one submitting
//! flag, so a front end disables the whole editor while any of them runs.

use super::{
    api::{Comment, CommentRequest, FormApi, ImageUpload, PostRequest, Redirect},
    error::FormError,
    submitting::Submitting,
    validate,
};
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub image: Option<ImageUpload>,
}

pub struct Composer<A> {
    api: A,
    submitting: Submitting,
}

impl<A: FormApi> Composer<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            submitting: Submitting::new(),
        }
    }

    #[must_use]
    pub fn with_submitting(mut self, submitting: Submitting) -> Self {
        self.submitting = submitting;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn submitting(&self) -> &Submitting {
        &self.submitting
    }

    /// # Errors
    /// Returns the local format errors, the server's joined validation
    /// messages, or the transport failure.
    #[instrument(skip(self, form), fields(title = %form.title.trim()))]
    pub async fn create_post(&self, form: &PostForm) -> Result<Redirect, FormError> {
        let _submitting = self.submitting.begin();

        let mut checks = vec![validate::title(&form.title), validate::content(&form.content)];
        if let Some(image) = &form.image {
            checks.push(validate::image(&image.mime, image.bytes.len()));
        }
        let errors = validate::collect(checks);
        if !errors.is_empty() {
            return Err(FormError::Format(errors));
        }

        let redirect = self
            .api
            .create_post(&PostRequest {
                title: form.title.trim().to_string(),
                content: form.content.clone(),
                image: form.image.clone(),
            })
            .await?;

        info!(redirect = %redirect.target, "post published");

        Ok(redirect)
    }

    /// Asks the server to write a draft for `title`.
    ///
    /// # Errors
    /// Returns a title error when the title is missing or nothing was
    /// generated, or the transport failure.
    #[instrument(skip(self))]
    pub async fn draft(&self, title: &str) -> Result<String, FormError> {
        let _submitting = self.submitting.begin();

        validate::title(title).map_err(|err| FormError::Format(vec![err]))?;

        self.api.draft(title.trim()).await
    }

    /// # Errors
    /// Returns the local format errors, the server's refusal, or the
    /// transport failure.
    #[instrument(skip(self, content))]
    pub async fn comment(&self, post_id: u64, content: &str) -> Result<Comment, FormError> {
        let _submitting = self.submitting.begin();

        let errors = validate::collect([validate::post_id(post_id), validate::content(content)]);
        if !errors.is_empty() {
            return Err(FormError::Format(errors));
        }

        let comment = self
            .api
            .comment(&CommentRequest {
                post_id,
                content: content.trim().to_string(),
            })
            .await?;

        info!(comment_id = comment.id, "comment added");

        Ok(comment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::forum::{
        error::{Field, TransportError},
        validate::IMAGE_MAX_BYTES,
        validator::tests::FakeApi,
    };

    fn post(image: Option<ImageUpload>) -> PostForm {
        PostForm {
            title: "Moon over the river".to_string(),
            content: "A short piece.".to_string(),
            image,
        }
    }

    #[tokio::test]
    async fn oversized_or_foreign_images_are_rejected_locally() {
        let composer = Composer::new(FakeApi::default());

        let gif = ImageUpload {
            file_name: "cat.gif".to_string(),
            mime: "image/gif".to_string(),
            bytes: vec![0; 16],
        };
        let err = composer.create_post(&post(Some(gif))).await.unwrap_err();
        assert_eq!(err.field_errors()[0].field, Field::Image);

        let huge = ImageUpload {
            file_name: "big.png".to_string(),
            mime: "image/png".to_string(),
            bytes: vec![0; IMAGE_MAX_BYTES + 1],
        };
        let err = composer.create_post(&post(Some(huge))).await.unwrap_err();
        assert_eq!(
            err.field_errors()[0].message,
            "image cannot exceed 5MB".to_string()
        );

        assert!(composer.api().calls().is_empty());
    }

    #[tokio::test]
    async fn blank_post_reports_title_and_content() {
        let composer = Composer::new(FakeApi::default());
        let form = PostForm {
            title: "   ".to_string(),
            content: "\n".to_string(),
            image: None,
        };

        let err = composer.create_post(&form).await.unwrap_err();
        let fields: Vec<Field> = err.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![Field::Title, Field::Content]);
    }

    #[tokio::test]
    async fn post_is_published_once_with_flag_raised() {
        let submitting = Submitting::new();
        let composer = Composer::new(FakeApi {
            post: Some(Ok(Redirect {
                target: "/".to_string(),
                message: None,
            })),
            submitting: Some(submitting.subscribe()),
            ..FakeApi::default()
        })
        .with_submitting(submitting);

        let redirect = composer.create_post(&post(None)).await.unwrap();
        assert_eq!(redirect.target, "/");
        assert_eq!(composer.api().calls(), vec!["create_post"]);
        assert_eq!(*composer.api().seen_submitting.lock().unwrap(), vec![true]);
        assert!(!composer.submitting().is_active());
    }

    #[tokio::test]
    async fn draft_needs_a_title() {
        let composer = Composer::new(FakeApi {
            draft: Some(Ok("Once upon a time".to_string())),
            ..FakeApi::default()
        });

        assert!(matches!(
            composer.draft(" ").await.unwrap_err(),
            FormError::Format(_)
        ));
        assert_eq!(composer.draft("Story").await.unwrap(), "Once upon a time");
        assert_eq!(composer.api().calls(), vec!["draft"]);
    }

    #[tokio::test]
    async fn comment_checks_post_and_content() {
        let composer = Composer::new(FakeApi {
            comment: Some(Err(TransportError::Rejected {
                status: 200,
                message: "post does not exist".to_string(),
            }
            .into())),
            ..FakeApi::default()
        });

        let err = composer.comment(0, "  ").await.unwrap_err();
        let fields: Vec<Field> = err.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![Field::PostId, Field::Content]);

        let err = composer.comment(7, "nice").await.unwrap_err();
        assert_eq!(err.to_string(), "request failed (200): post does not exist");
        assert!(!composer.submitting().is_active());
    }
}
