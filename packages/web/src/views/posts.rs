//! Post list, create and edit handlers.

use axum::extract::{Multipart, Path};
use axum::response::{IntoResponse, Response};
use minijinja::context;

use api::auth::HOME_PATH;
use api::models::FieldError;
use api::posts::{save_post, ImageUpload};
use api::{Post, PostInput};

use crate::context::RequestContext;
use crate::error::{multipart_error, Result};
use crate::views::found;

pub const IMAGE_UPLOAD_FAILED_MESSAGE: &str = "Image upload failed";

/// Upper bound for a post form including its image.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// `GET /` and `GET /home`
pub async fn home(ctx: RequestContext) -> Result<Response> {
    let posts = ctx.state.posts.list_posts().await?;

    let page = ctx
        .render(
            "index.html",
            context! {
                title => "Home Page",
                posts => posts,
                image_source => ctx.state.blobs.public_base_url(),
            },
        )
        .await?;
    Ok(page.into_response())
}

/// `GET /new_post`
pub async fn new_post_form(ctx: RequestContext) -> Result<Response> {
    render_form(&ctx, None, &PostInput::default(), Vec::new()).await
}

/// `POST /new_post`
pub async fn create_post(ctx: RequestContext, multipart: Multipart) -> Result<Response> {
    let (input, image) = read_form(multipart).await?;
    submit(&ctx, None, input, image).await
}

/// `GET /post/{id}`
pub async fn edit_post_form(ctx: RequestContext, Path(id): Path<i64>) -> Result<Response> {
    let post = find_post(&ctx, id).await?;
    render_form(&ctx, Some(&post), &PostInput::from_post(&post), Vec::new()).await
}

/// `POST /post/{id}`
pub async fn update_post(ctx: RequestContext, Path(id): Path<i64>, multipart: Multipart) -> Result<Response> {
    let post = find_post(&ctx, id).await?;
    let (input, image) = read_form(multipart).await?;
    submit(&ctx, Some(&post), input, image).await
}

async fn find_post(ctx: &RequestContext, id: i64) -> Result<Post> {
    ctx.state.posts.find_post(id).await?.ok_or_else(|| {
        api::Error::NotFound {
            resource: "Post",
            id: id.to_string(),
        }
        .into()
    })
}

async fn submit(ctx: &RequestContext, existing: Option<&Post>, input: PostInput, image: Option<ImageUpload>) -> Result<Response> {
    let (input, mut errors) = match input.validate() {
        Ok(input) => (input, Vec::new()),
        Err((input, errors)) => (input, errors),
    };
    if let Some(Err(error)) = image.as_ref().map(ImageUpload::extension) {
        errors.push(error);
    }
    if !errors.is_empty() {
        return render_form(ctx, existing, &input, errors).await;
    }

    let saved = save_post(
        ctx.state.posts.as_ref(),
        ctx.state.blobs.as_ref(),
        existing,
        &input,
        image,
        ctx.user_id()?,
    )
    .await?;

    if saved.image_failed {
        ctx.session.push_flash("error", IMAGE_UPLOAD_FAILED_MESSAGE).await?;
    }
    Ok(found(HOME_PATH))
}

async fn render_form(ctx: &RequestContext, existing: Option<&Post>, input: &PostInput, errors: Vec<FieldError>) -> Result<Response> {
    let (title, form_action) = match existing {
        Some(post) => ("Edit Post", format!("/post/{}", post.id)),
        None => ("Create Post", "/new_post".to_string()),
    };

    let page = ctx
        .render(
            "post.html",
            context! {
                title => title,
                form_action => form_action,
                form => input,
                errors => errors,
                image_path => existing.and_then(|post| post.image_path.clone()),
                image_source => ctx.state.blobs.public_base_url(),
            },
        )
        .await?;
    Ok(page.into_response())
}

/// Read the text fields and the optional `image_path` file of the post form.
async fn read_form(mut multipart: Multipart) -> Result<(PostInput, Option<ImageUpload>)> {
    let mut input = PostInput::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => input.title = field.text().await.map_err(multipart_error)?,
            "author" => input.author = field.text().await.map_err(multipart_error)?,
            "body" => input.body = field.text().await.map_err(multipart_error)?,
            "image_path" => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                image = ImageUpload::from_part(filename.as_deref(), data.to_vec());
            }
            _ => {}
        }
    }

    Ok((input, image))
}
