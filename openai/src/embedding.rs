use seabrief_core::{EmbeddingModel, Result as CoreResult};

use crate::{
    client::OpenAI, error::OpenAIError, request::EmbeddingRequest, response::EmbeddingResponse,
};

impl EmbeddingModel for OpenAI {
    fn dim(&self) -> usize {
        self.config().embedding_dimensions
    }

    async fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        Ok(self.embed_once(text).await?)
    }
}

impl OpenAI {
    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, OpenAIError> {
        let cfg = self.config();
        let request = EmbeddingRequest {
            model: &cfg.embedding_model,
            input: text,
            dimensions: cfg.request_dimensions.then_some(cfg.embedding_dimensions),
        };
        let response: EmbeddingResponse = self
            .send_json("embedding", || self.post("/embeddings").json(&request))
            .await?;
        let vector = response
            .into_vector()
            .ok_or_else(|| OpenAIError::Api("embedding response missing vector data".into()))?;
        if vector.len() != cfg.embedding_dimensions {
            return Err(OpenAIError::Api(format!(
                "embedding has {} dimensions, expected {}",
                vector.len(),
                cfg.embedding_dimensions
            )));
        }
        Ok(vector)
    }
}
