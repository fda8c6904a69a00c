// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Domain-label matching — locates each domain's label phrase in the token
// stream and assigns detected rows to domains.

use scoremark_core::types::Domain;
use tracing::debug;

use crate::ocr::recognize::OcrToken;
use crate::vision::detect::MarkBox;
use crate::vision::rows::MarkRow;

/// Vertical anchor of a matched domain label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LabelHit {
    /// Top coordinate of the first token of the matched phrase.
    pub top: f32,
    /// Mean confidence across the matched tokens.
    pub mean_confidence: f32,
}

/// Find the best occurrence of `words` as a contiguous run in `tokens`.
///
/// Token text is lower-cased and compared to each phrase word exactly, in
/// order. Among all occurrences the one with the highest mean confidence
/// wins; an exact confidence tie keeps the earliest occurrence.
pub(crate) fn locate_label(tokens: &[OcrToken], words: &[&str]) -> Option<LabelHit> {
    if words.is_empty() || tokens.len() < words.len() {
        return None;
    }

    let mut best: Option<LabelHit> = None;
    for start in 0..=(tokens.len() - words.len()) {
        let run = &tokens[start..start + words.len()];
        let matches = run
            .iter()
            .zip(words)
            .all(|(token, word)| token.text.to_lowercase() == *word);
        if !matches {
            continue;
        }

        let mean_confidence =
            run.iter().map(|token| token.confidence).sum::<f32>() / words.len() as f32;
        if best.is_none_or(|hit| mean_confidence > hit.mean_confidence) {
            best = Some(LabelHit {
                top: run[0].y,
                mean_confidence,
            });
        }
    }
    best
}

/// Assign detected rows to one section's domains.
///
/// Tokens with empty text are discarded up front. Domains whose label
/// phrase was located claim, in declared order, the unclaimed row whose
/// center is nearest the label's top coordinate (an exact distance tie goes
/// to the topmost row). Remaining domains then take the remaining rows
/// top-to-bottom, one-to-one: surplus domains end up with no boxes, surplus
/// rows stay unused. No row is ever handed to two domains.
pub(crate) fn assign_rows(
    domains: &[Domain],
    tokens: &[OcrToken],
    rows: Vec<MarkRow>,
) -> Vec<(Domain, Vec<MarkBox>)> {
    let tokens: Vec<OcrToken> = tokens
        .iter()
        .filter(|token| !token.text.trim().is_empty())
        .cloned()
        .collect();

    let hits: Vec<Option<LabelHit>> = domains
        .iter()
        .map(|domain| locate_label(&tokens, domain.label_words()))
        .collect();

    let mut claimed = vec![false; rows.len()];
    let mut assigned: Vec<Option<usize>> = vec![None; domains.len()];

    // Label-anchored pass: each matched domain claims its nearest free row.
    for (domain_index, hit) in hits.iter().enumerate() {
        let Some(hit) = hit else { continue };
        let nearest = rows
            .iter()
            .enumerate()
            .filter(|(row_index, _)| !claimed[*row_index])
            .map(|(row_index, row)| (row_index, (row.center_y() - hit.top).abs()))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some((row_index, _)) = nearest {
            claimed[row_index] = true;
            assigned[domain_index] = Some(row_index);
        }
    }

    // Fallback pass: unmatched domains take leftover rows in declared order.
    let mut leftover = (0..rows.len()).filter(|row_index| !claimed[*row_index]);
    for (domain_index, slot) in assigned.iter_mut().enumerate() {
        if slot.is_none() && hits[domain_index].is_none() {
            *slot = leftover.next();
        }
    }

    debug!(
        matched = hits.iter().filter(|hit| hit.is_some()).count(),
        rows = rows.len(),
        "Rows assigned to domains"
    );

    let mut row_slots: Vec<Option<MarkRow>> = rows.into_iter().map(Some).collect();
    domains
        .iter()
        .zip(assigned)
        .map(|(&domain, slot)| {
            let boxes = slot
                .and_then(|row_index| row_slots[row_index].take())
                .map(MarkRow::into_boxes)
                .unwrap_or_default();
            (domain, boxes)
        })
        .collect()
}
