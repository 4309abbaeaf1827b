use crate::types::Delivery;
use anyhow::Context;
use std::collections::VecDeque;
use std::path::PathBuf;

const MAX_DELIVERIES: usize = 50;
const DELIVERIES_FILE: &str = "deliveries.json";

/// Ring buffer of recent deliveries, optionally mirrored to disk.
pub struct DeliveryStore {
    deliveries: VecDeque<Delivery>,
    data_dir: Option<PathBuf>,
}

impl DeliveryStore {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        Self {
            deliveries: VecDeque::new(),
            data_dir,
        }
    }

    pub fn load(&mut self) -> anyhow::Result<()> {
        let Some(dir) = &self.data_dir else {
            return Ok(());
        };
        let path = dir.join(DELIVERIES_FILE);
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let items: Vec<Delivery> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        self.deliveries = items.into_iter().collect();
        while self.deliveries.len() > MAX_DELIVERIES {
            self.deliveries.pop_front();
        }
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = &self.data_dir else {
            return Ok(());
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(DELIVERIES_FILE);
        let items: Vec<&Delivery> = self.deliveries.iter().collect();
        let content = serde_json::to_string_pretty(&items).context("failed to serialize deliveries")?;
        std::fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn record(&mut self, delivery: Delivery) {
        if self.deliveries.len() >= MAX_DELIVERIES {
            self.deliveries.pop_front();
        }
        self.deliveries.push_back(delivery);
    }

    /// Newest first.
    pub fn recent(&self) -> Vec<&Delivery> {
        self.deliveries.iter().rev().collect()
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }
}
