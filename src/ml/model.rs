// ============================================================
// Layer 5 — QaSystem (Match-LSTM + Answer Pointer)
// ============================================================
// Full forward pass:
//
//   question ids ─┐                        ┌─ Encoder ─┐
//                 ├─ embeddings ─ dropout ─┤           ├─► H_r ─► Decoder ─► β
//   context ids  ─┘                        └───────────┘
//
// Embeddings come from pretrained word vectors and stay frozen
// unless `train_embeddings` is set.
//
// Loss: mean cross-entropy of every pointer step against its
// target position (see domain::span::pointer_targets).
//
// Reference: Wang & Jiang (2016)
//            Burn Book §3 (Building Blocks)

use burn::{
    module::Param,
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Initializer,
    },
    prelude::*,
};

use crate::data::batcher::QaBatch;
use crate::domain::span::PointerMode;
use crate::ml::decoder::{Decoder, DecoderConfig, PointerOutput};
use crate::ml::encoder::{Encoder, EncoderConfig};

// #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct QaSystemConfig {
    pub vocab_size:          usize,
    pub embedding_dim:       usize,
    pub state_size:          usize,
    pub max_question_length: usize,
    pub max_context_length:  usize,
    #[config(default = 15)]
    pub max_answer_length:   usize,
    #[config(default = "PointerMode::Boundary")]
    pub pointer_mode:        PointerMode,
    #[config(default = 0.15)]
    pub dropout:             f64,
    #[config(default = false)]
    pub train_embeddings:    bool,
    #[config(default = "Initializer::XavierUniform { gain: 1.0 }")]
    pub initializer:         Initializer,
}

impl QaSystemConfig {
    pub fn pointer_steps(&self) -> usize {
        self.pointer_mode.steps(self.max_answer_length)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> QaSystem<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);
        let encoder   = EncoderConfig::new(self.embedding_dim, self.state_size)
            .with_initializer(self.initializer.clone())
            .init(device);
        let decoder   = DecoderConfig::new(self.state_size, self.pointer_steps())
            .with_initializer(self.initializer.clone())
            .init(device);
        QaSystem {
            embedding,
            encoder,
            decoder,
            dropout:          DropoutConfig::new(self.dropout).init(),
            train_embeddings: self.train_embeddings,
        }
    }
}

#[derive(Module, Debug)]
pub struct QaSystem<B: Backend> {
    pub embedding:        Embedding<B>,
    pub encoder:          Encoder<B>,
    pub decoder:          Decoder<B>,
    pub dropout:          Dropout,
    pub train_embeddings: bool,
}

impl<B: Backend> QaSystem<B> {
    /// Replace the embedding table with pretrained vectors [vocab, dim].
    pub fn with_pretrained_embeddings(mut self, weights: Tensor<B, 2>) -> Self {
        self.embedding.weight = Param::from_tensor(weights);
        self
    }

    fn embed(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let embedded = self.embedding.forward(ids);
        let embedded = if self.train_embeddings { embedded } else { embedded.detach() };
        self.dropout.forward(embedded)
    }

    pub fn forward(&self, batch: &QaBatch<B>) -> PointerOutput<B> {
        let question = self.embed(batch.question_ids.clone());
        let context  = self.embed(batch.context_ids.clone());

        let encodings = self.encoder.encode(
            question, &batch.question_lengths,
            context,  &batch.context_lengths,
        );
        self.decoder.decode(encodings, &batch.context_lengths)
    }

    /// targets: [batch, steps] pointer positions
    pub fn forward_loss(
        &self,
        batch:   &QaBatch<B>,
        targets: Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, PointerOutput<B>) {
        let output = self.forward(batch);
        let loss   = pointer_loss(output.logits.clone(), targets);
        (loss, output)
    }
}

/// Mean cross-entropy over every (example, step) pair.
pub fn pointer_loss<B: Backend>(logits: Tensor<B, 3>, targets: Tensor<B, 2, Int>) -> Tensor<B, 1> {
    let [batch_size, steps, positions] = logits.dims();
    let ce = CrossEntropyLossConfig::new().init(&logits.device());
    ce.forward(
        logits.reshape([batch_size * steps, positions]),
        targets.reshape([batch_size * steps]),
    )
}
