//! Percentage splits of contribution credit between personas.
//!
//! Two regimes, chosen by `auto_split`:
//! - auto: every owner gets an equal share, divided equally between that
//!   owner's personas;
//! - manual: editing one persona moves the difference onto the other
//!   personas of the same owner, proportionally to their current shares,
//!   so every owner's total (and the grand total) stays put.

use mixdesk_core::ranges::{LEVEL_MAX, SPLIT_TOLERANCE};
use mixdesk_core::{OwnerId, PersonaId, Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Rounding slack when comparing percentages.
const EPSILON: f64 = 1e-9;

/// A persona taking part in the split, with the account that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitMember {
    pub persona_id: PersonaId,
    pub owner_id: OwnerId,
}

/// One persona's share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitEntry {
    pub persona_id: PersonaId,
    pub owner_id: OwnerId,
    pub percentage: f64,
}

/// The persisted form of a split table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRecord {
    pub auto_split: bool,
    pub splits: BTreeMap<PersonaId, f64>,
}

/// Percentage allocation for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitTable {
    auto_split: bool,
    entries: Vec<SplitEntry>,
}

impl Default for SplitTable {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SplitTable {
    pub fn new(auto_split: bool) -> Self {
        Self {
            auto_split,
            entries: Vec::new(),
        }
    }

    /// Build a table for `members`, shares distributed by ownership.
    pub fn with_members(members: Vec<SplitMember>, auto_split: bool) -> Self {
        let mut table = Self::new(auto_split);
        table.set_members(members);
        table
    }

    pub fn auto_split(&self) -> bool {
        self.auto_split
    }

    pub fn entries(&self) -> &[SplitEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn percentage(&self, persona: &PersonaId) -> Option<f64> {
        self.entry(persona).map(|e| e.percentage)
    }

    fn entry(&self, persona: &PersonaId) -> Option<&SplitEntry> {
        self.entries.iter().find(|e| &e.persona_id == persona)
    }

    /// Sum over every persona.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.percentage).sum()
    }

    /// Whether the shares add up to 100 (an empty table is balanced).
    pub fn is_balanced(&self) -> bool {
        self.entries.is_empty() || (self.total() - LEVEL_MAX).abs() <= SPLIT_TOLERANCE
    }

    /// Sum of shares per owner.
    pub fn owner_totals(&self) -> BTreeMap<OwnerId, f64> {
        let mut totals = BTreeMap::new();
        for entry in &self.entries {
            *totals.entry(entry.owner_id.clone()).or_insert(0.0) += entry.percentage;
        }
        totals
    }

    /// Replace the participating personas.
    ///
    /// When the membership actually changes the old shares no longer add up,
    /// so the table is redistributed by ownership. Returns whether anything
    /// changed.
    pub fn set_members(&mut self, members: Vec<SplitMember>) -> bool {
        let mut unique: Vec<SplitMember> = Vec::with_capacity(members.len());
        for member in members {
            if !unique.iter().any(|m| m.persona_id == member.persona_id) {
                unique.push(member);
            }
        }
        let unchanged = unique.len() == self.entries.len()
            && unique.iter().zip(&self.entries).all(|(m, e)| {
                m.persona_id == e.persona_id && m.owner_id == e.owner_id
            });
        if unchanged {
            return false;
        }
        self.entries = unique
            .into_iter()
            .map(|m| SplitEntry {
                persona_id: m.persona_id,
                owner_id: m.owner_id,
                percentage: 0.0,
            })
            .collect();
        self.distribute_by_ownership();
        debug!(personas = self.entries.len(), "Split members changed");
        true
    }

    /// Switch regimes. Turning auto-split on recomputes every share.
    pub fn set_auto_split(&mut self, on: bool) {
        self.auto_split = on;
        if on {
            self.distribute_by_ownership();
        }
        info!(auto_split = on, "Split regime changed");
    }

    /// Discard manual edits and redistribute by ownership, leaving the
    /// regime flag as it is.
    pub fn reset(&mut self) {
        self.distribute_by_ownership();
    }

    /// Set one persona's share by hand, rebalancing its owner's other
    /// personas.
    pub fn set_percentage(&mut self, persona: &PersonaId, value: f64) -> Result<()> {
        if self.auto_split {
            return Err(ValidationError::AutoSplitActive.into());
        }
        if !value.is_finite() || !(0.0..=LEVEL_MAX).contains(&value) {
            return Err(ValidationError::PercentageOutOfRange { value }.into());
        }
        let target = self
            .entry(persona)
            .ok_or_else(|| ValidationError::UnknownPersona(persona.clone()))?;
        let owner = target.owner_id.clone();
        let old = target.percentage;

        let siblings: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.owner_id == owner && &e.persona_id != persona)
            .map(|(i, _)| i)
            .collect();
        if siblings.is_empty() {
            return Err(ValidationError::NoSiblings {
                persona: persona.clone(),
            }
            .into());
        }
        let sibling_total: f64 = siblings.iter().map(|&i| self.entries[i].percentage).sum();
        let available = old + sibling_total;
        if value > available + EPSILON {
            return Err(ValidationError::PercentageExceedsOwnerShare { value, available }.into());
        }

        let diff = value - old;
        if sibling_total > EPSILON {
            for &i in &siblings {
                let share = self.entries[i].percentage / sibling_total;
                self.entries[i].percentage -= diff * share;
            }
        } else {
            let each = (available - value) / siblings.len() as f64;
            for &i in &siblings {
                self.entries[i].percentage = each;
            }
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.persona_id == persona) {
            entry.percentage = value;
        }
        for entry in &mut self.entries {
            entry.percentage = entry.percentage.clamp(0.0, LEVEL_MAX);
        }
        debug!(persona = %persona, value, "Split percentage set");
        Ok(())
    }

    /// Equal share per owner, divided equally among that owner's personas.
    fn distribute_by_ownership(&mut self) {
        let mut per_owner: BTreeMap<OwnerId, usize> = BTreeMap::new();
        for entry in &self.entries {
            *per_owner.entry(entry.owner_id.clone()).or_insert(0) += 1;
        }
        if per_owner.is_empty() {
            return;
        }
        let owner_share = LEVEL_MAX / per_owner.len() as f64;
        for entry in &mut self.entries {
            let personas = per_owner[&entry.owner_id] as f64;
            entry.percentage = owner_share / personas;
        }
    }

    /// Snapshot for persistence.
    pub fn record(&self) -> SplitRecord {
        SplitRecord {
            auto_split: self.auto_split,
            splits: self
                .entries
                .iter()
                .map(|e| (e.persona_id.clone(), e.percentage))
                .collect(),
        }
    }

    /// Load persisted shares onto the current members.
    ///
    /// Personas missing from the record keep their current share. If the
    /// result does not add up to 100 the table is redistributed by ownership
    /// and `false` is returned.
    pub fn apply_record(&mut self, record: &SplitRecord) -> bool {
        self.auto_split = record.auto_split;
        if self.auto_split {
            self.distribute_by_ownership();
            return true;
        }
        for entry in &mut self.entries {
            if let Some(&value) = record.splits.get(&entry.persona_id) {
                if value.is_finite() {
                    entry.percentage = value.clamp(0.0, LEVEL_MAX);
                }
            }
        }
        if self.is_balanced() {
            true
        } else {
            debug!(total = self.total(), "Stored splits unbalanced, redistributing");
            self.distribute_by_ownership();
            false
        }
    }
}
