pub type SectionId = String;

/// Per-section generation status reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionStatus {
    #[default]
    Waiting,
    TextComplete,
    Complete,
}

/// One outline section plus its current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntry {
    pub section_id: SectionId,
    pub title: String,
    pub learning_goals: Vec<String>,
    pub status: SectionStatus,
}

/// Outline skeleton delivered once per conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutlineSeed {
    pub sections: Vec<OutlineSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineSection {
    pub section_id: SectionId,
    pub title: String,
    pub learning_goals: Vec<String>,
}

/// Builds the initial section list from an outline, every entry `Waiting`.
pub fn seed_sections(outline: &OutlineSeed) -> Vec<SectionEntry> {
    outline
        .sections
        .iter()
        .map(|section| SectionEntry {
            section_id: section.section_id.clone(),
            title: section.title.clone(),
            learning_goals: section.learning_goals.clone(),
            status: SectionStatus::Waiting,
        })
        .collect()
}

/// Merges a poll response into the held list.
///
/// Invariants: order is preserved, the id set never changes once seeded, an
/// incoming entry replaces the held entry with the same id wholesale, held
/// entries without a match are untouched, incoming ids that were never seeded
/// are dropped. An empty held list adopts the incoming list as-is.
pub fn merge_sections(held: &mut Vec<SectionEntry>, incoming: &[SectionEntry]) {
    if held.is_empty() {
        held.extend_from_slice(incoming);
        return;
    }
    for entry in held.iter_mut() {
        if let Some(update) = incoming
            .iter()
            .find(|candidate| candidate.section_id == entry.section_id)
        {
            *entry = update.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{merge_sections, seed_sections, OutlineSeed, OutlineSection, SectionEntry, SectionStatus};

    fn entry(id: &str, status: SectionStatus) -> SectionEntry {
        SectionEntry {
            section_id: id.to_string(),
            title: format!("Section {id}"),
            learning_goals: Vec::new(),
            status,
        }
    }

    #[test]
    fn seeding_defaults_every_section_to_waiting() {
        let outline = OutlineSeed {
            sections: vec![OutlineSection {
                section_id: "s1".to_string(),
                title: "Intro".to_string(),
                learning_goals: vec!["goal".to_string()],
            }],
        };
        let seeded = seed_sections(&outline);
        assert_eq!(seeded.len(), 1);
        assert_eq!(seeded[0].status, SectionStatus::Waiting);
        assert_eq!(seeded[0].title, "Intro");
    }

    #[test]
    fn merge_replaces_only_matching_ids_in_place() {
        let mut held = vec![
            entry("a", SectionStatus::Waiting),
            entry("b", SectionStatus::Waiting),
            entry("c", SectionStatus::Waiting),
        ];
        let before_a = held[0].clone();
        let before_c = held[2].clone();

        merge_sections(&mut held, &[entry("b", SectionStatus::Complete)]);

        assert_eq!(held.len(), 3);
        assert_eq!(held[0], before_a);
        assert_eq!(held[1].status, SectionStatus::Complete);
        assert_eq!(held[2], before_c);
        let ids: Vec<_> = held.iter().map(|s| s.section_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn merge_drops_ids_that_were_never_seeded() {
        let mut held = vec![entry("a", SectionStatus::Waiting)];
        merge_sections(&mut held, &[entry("z", SectionStatus::Complete)]);
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].section_id, "a");
    }

    #[test]
    fn merge_into_empty_list_adopts_response() {
        let mut held = Vec::new();
        merge_sections(&mut held, &[entry("a", SectionStatus::TextComplete)]);
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].status, SectionStatus::TextComplete);
    }
}
