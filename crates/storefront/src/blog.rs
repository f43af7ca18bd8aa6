//! Markdown blog posts.
//!
//! Posts are loaded from the blog directory once at startup. Each file has a
//! YAML front matter block followed by markdown:
//!
//! ```markdown
//! ---
//! title: Choosing a Sofa
//! date: 2025-02-01
//! description: Fabric, frame, and fit.
//! image: /images/blog/sofa.jpg
//! ---
//!
//! Body text...
//! ```

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::{Deserialize, Serialize};

/// Front matter for a blog post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostMeta {
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, skip_serializing)]
    pub draft: bool,
}

/// A rendered blog post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub slug: String,
    #[serde(flatten)]
    pub meta: PostMeta,
    pub content_html: String,
    pub reading_time_minutes: u32,
}

/// Listing entry without the rendered body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary<'a> {
    pub slug: &'a str,
    #[serde(flatten)]
    pub meta: &'a PostMeta,
    pub reading_time_minutes: u32,
}

impl<'a> From<&'a Post> for PostSummary<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            slug: &post.slug,
            meta: &post.meta,
            reading_time_minutes: post.reading_time_minutes,
        }
    }
}

/// In-memory set of published posts, newest first.
#[derive(Debug, Clone, Default)]
pub struct BlogStore {
    posts: Arc<Vec<Post>>,
}

impl BlogStore {
    /// Load all posts from `dir`.
    ///
    /// A missing directory yields an empty blog. Files that fail to parse are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn load(dir: &Path) -> Result<Self, BlogError> {
        let mut posts = Vec::new();

        if !dir.exists() {
            tracing::info!("Blog directory does not exist yet: {:?}", dir);
            return Ok(Self::default());
        }

        let entries = std::fs::read_dir(dir).map_err(|e| BlogError::Io(e.to_string()))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                match load_post(&path) {
                    Ok(post) if post.meta.draft => {
                        tracing::debug!("Skipping draft post: {}", post.slug);
                    }
                    Ok(post) => {
                        tracing::info!("Loaded post: {}", post.slug);
                        posts.push(post);
                    }
                    Err(e) => {
                        tracing::error!("Failed to load post {:?}: {}", path, e);
                    }
                }
            }
        }

        posts.sort_by(|a, b| b.meta.date.cmp(&a.meta.date));

        Ok(Self {
            posts: Arc::new(posts),
        })
    }

    /// All posts, newest first.
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter()
    }

    /// Get a post by slug.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

fn load_post(path: &Path) -> Result<Post, BlogError> {
    let content = std::fs::read_to_string(path).map_err(|e| BlogError::Io(e.to_string()))?;

    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| BlogError::Parse("Invalid filename".to_string()))?
        .to_string();

    parse_post(slug, &content)
}

fn parse_post(slug: String, content: &str) -> Result<Post, BlogError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PostMeta> = matter
        .parse(content)
        .map_err(|e| BlogError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| BlogError::Parse("Missing frontmatter".to_string()))?;

    // Average 200 words per minute
    let word_count = parsed.content.split_whitespace().count();
    let reading_time_minutes = u32::try_from(word_count.div_ceil(200)).unwrap_or(u32::MAX);

    Ok(Post {
        slug,
        meta,
        content_html: render_markdown(&parsed.content),
        reading_time_minutes: reading_time_minutes.max(1),
    })
}

/// Render markdown to HTML with GitHub Flavored Markdown extensions.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());
    markdown_to_html(content, &options)
}

/// Blog loading errors.
#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const POST: &str = "---\ntitle: Caring for Oak\ndate: 2025-03-04\ndescription: Oil twice a year.\n---\n\n# Oak\n\nWipe with a **dry** cloth.\n";

    #[test]
    fn test_parse_post() {
        let post = parse_post("caring-for-oak".to_string(), POST).unwrap();
        assert_eq!(post.meta.title, "Caring for Oak");
        assert_eq!(post.meta.date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert!(post.content_html.contains("<strong>dry</strong>"));
        assert_eq!(post.reading_time_minutes, 1);
        assert!(!post.meta.draft);
    }

    #[test]
    fn test_parse_post_without_front_matter_fails() {
        assert!(parse_post("bare".to_string(), "Just text").is_err());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let store = BlogStore::load(Path::new("/nonexistent/furnish/blog")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_summary_omits_body() {
        let post = parse_post("caring-for-oak".to_string(), POST).unwrap();
        let value = serde_json::to_value(PostSummary::from(&post)).unwrap();
        assert_eq!(value["slug"], "caring-for-oak");
        assert_eq!(value["title"], "Caring for Oak");
        assert!(value.get("contentHtml").is_none());
        assert!(value.get("draft").is_none());
    }
}
