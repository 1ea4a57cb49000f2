//! Compound words produced by the classifier

use serde::{Deserialize, Serialize};

use crate::node::{FormsEdge, WordNode};

/// An accepted compound, ready for ingestion.
///
/// `characters` is never empty: a form with no qualifying characters is
/// rejected instead of producing a `CompoundWord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundWord {
    pub word: String,
    pub reading: String,
    pub meaning: String,
    pub characters: Vec<char>,
}

impl CompoundWord {
    /// Word node carried by this compound
    pub fn to_word_node(&self) -> WordNode {
        WordNode::new(&self.word, &self.reading, &self.meaning)
    }

    /// FORMS edges in character order
    pub fn edges(&self) -> impl Iterator<Item = FormsEdge> + '_ {
        self.characters
            .iter()
            .enumerate()
            .map(|(i, c)| FormsEdge::new(*c, &self.word, i as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_are_positioned() {
        let compound = CompoundWord {
            word: "木林".to_string(),
            reading: "もくりん".to_string(),
            meaning: "grove".to_string(),
            characters: vec!['木', '林'],
        };

        let edges: Vec<_> = compound.edges().collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0], FormsEdge::new('木', "木林", 0));
        assert_eq!(edges[1], FormsEdge::new('林', "木林", 1));
        assert_eq!(compound.to_word_node().length, 2);
    }
}
