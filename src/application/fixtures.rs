// A throwaway workspace for use case tests: vocab.dat, a "val"
// split of id files and an untrained epoch-1 checkpoint, all in
// one temp dir.

use burn::backend::NdArray;
use std::fs;
use tempfile::TempDir;

use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{QaSystem, QaSystemConfig};

pub const TOKENS: [&str; 10] = ["<pad>", "<sos>", "<unk>", "when", "did", "it", "open", "in", "1889", "."];

pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fx = Self { dir: tempfile::tempdir().unwrap() };
        fs::write(fx.path("vocab.dat"), TOKENS.join("\n") + "\n").unwrap();

        fs::create_dir_all(fx.path("data")).unwrap();
        fx.write_data("val.ids.question", "3 4 5 6\n3 5 6\n4 5\n");
        fx.write_data("val.ids.context", "5 6 7 8 9\n5 6 7 8\n5 6 7 8 9 8 7 6 5\n");
        // the last answer starts past max_context_length = 8
        fx.write_data("val.span", "3 3\n2 3\n8 8\n");

        let config = QaSystemConfig::new(TOKENS.len(), 4, 3, 5, 8).with_dropout(0.0);
        let model: QaSystem<NdArray> = config.init(&Default::default());
        let ckpt = CheckpointManager::new(fx.path("train")).unwrap();
        ckpt.save_model_config(&config).unwrap();
        ckpt.save_model(&model, 1, 0).unwrap();
        fx
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    pub fn write_data(&self, name: &str, body: &str) {
        fs::write(self.dir.path().join("data").join(name), body).unwrap();
    }

    pub fn data_dir(&self) -> String {
        self.path("data")
    }

    pub fn train_dir(&self) -> String {
        self.path("train")
    }

    pub fn vocab_path(&self) -> String {
        self.path("vocab.dat")
    }
}
