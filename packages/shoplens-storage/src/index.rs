use shoplens_config::{Index, IndexBackend};

use crate::{Result, models::IndexMatch, pinecone::PineconeIndex, qdrant::QdrantIndex};

/// The configured vector index backend.
pub enum VectorIndex {
	Pinecone(PineconeIndex),
	Qdrant(QdrantIndex),
}
impl VectorIndex {
	pub fn connect(cfg: &Index) -> Result<Self> {
		match cfg.backend {
			IndexBackend::Pinecone => Ok(Self::Pinecone(PineconeIndex::new(cfg)?)),
			IndexBackend::Qdrant => Ok(Self::Qdrant(QdrantIndex::new(cfg)?)),
		}
	}

	pub fn backend(&self) -> IndexBackend {
		match self {
			Self::Pinecone(_) => IndexBackend::Pinecone,
			Self::Qdrant(_) => IndexBackend::Qdrant,
		}
	}

	pub async fn query(&self, vector: &[f32], top_k: u32) -> Result<Vec<IndexMatch>> {
		match self {
			Self::Pinecone(index) => index.query(vector, top_k).await,
			Self::Qdrant(index) => index.query(vector, top_k).await,
		}
	}
}
