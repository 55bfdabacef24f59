use classifier_client::Classifier;
use polinet_core::{AggregationMode, CoreError, Post, ScoreVector, UserScoreRow};
use tracing::debug;

/// Aggregates one user's posts into a single score row. Returns
/// `Ok(None)` when there is nothing to score; the caller drops the
/// row rather than emitting a zero-filled one.
pub async fn aggregate_user(
    user: &str,
    posts: &[Post],
    classifier: &dyn Classifier,
    mode: AggregationMode,
) -> Result<Option<UserScoreRow>, CoreError> {
    if posts.is_empty() {
        debug!(user, "No posts to aggregate");
        return Ok(None);
    }

    let scores = match mode {
        AggregationMode::PerPostMean => {
            let mut vectors = Vec::with_capacity(posts.len());
            for post in posts {
                vectors.push(classifier.score_text(&post.text).await?);
            }
            ScoreVector::mean_of(&vectors).expect("mean of non-empty score list")
        }
        AggregationMode::Corpus => {
            let texts: Vec<String> = posts.iter().map(|p| p.text.clone()).collect();
            classifier.score_corpus(&texts).await?
        }
    };

    Ok(Some(UserScoreRow {
        user: user.to_string(),
        scores,
    }))
}
