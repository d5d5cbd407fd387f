// ABOUTME: Canned generation variant used when external generation is disabled
// ABOUTME: Returns fixed plan-shaped text without any network call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{FinishReason, Generation, GenerationMeta, ProviderKind};

/// Model id reported by the canned variant
pub const CANNED_MODEL_ID: &str = "canned";

/// Plan-shaped reply with no days, so every slot comes from the rule-based builder
pub const CANNED_PLAN_TEXT: &str = r#"```json
{
  "title": "",
  "days": [],
  "notes": "AI generation is unavailable; this plan was assembled from standard templates."
}
```"#;

/// Fixed-response provider
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedProvider;

impl CannedProvider {
    /// Produce the canned generation
    #[must_use]
    pub fn generate(&self, fallback_used: bool) -> Generation {
        Generation {
            text: CANNED_PLAN_TEXT.to_owned(),
            meta: GenerationMeta {
                provider_kind: ProviderKind::Canned,
                model_id: CANNED_MODEL_ID.to_owned(),
                finish_reason: FinishReason::Complete,
                block_reason: None,
                continued_rounds: 0,
                fallback_used,
            },
        }
    }
}
