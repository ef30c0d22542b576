//! Scene identifiers and the fixed journey order.

use std::fmt;

/// One full-screen stop on the journey.
///
/// The set is closed and totally ordered by [`SEQUENCE`]. Navigation can only move
/// to an adjacent entry (or restart from the last one back to the first).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneId {
    Opening,
    Earth,
    SolarSystem,
    MilkyWay,
    Universe,
    Final,
}

/// The journey order. Index in this array is the scene's position.
pub const SEQUENCE: [SceneId; 6] = [
    SceneId::Opening,
    SceneId::Earth,
    SceneId::SolarSystem,
    SceneId::MilkyWay,
    SceneId::Universe,
    SceneId::Final,
];

impl SceneId {
    pub const FIRST: SceneId = SEQUENCE[0];
    pub const LAST: SceneId = SEQUENCE[SEQUENCE.len() - 1];

    /// Position of this scene in [`SEQUENCE`].
    pub fn index(self) -> usize {
        match self {
            SceneId::Opening => 0,
            SceneId::Earth => 1,
            SceneId::SolarSystem => 2,
            SceneId::MilkyWay => 3,
            SceneId::Universe => 4,
            SceneId::Final => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<SceneId> {
        SEQUENCE.get(index).copied()
    }

    /// The following scene, or `None` at the end of the journey.
    pub fn next(self) -> Option<SceneId> {
        Self::from_index(self.index() + 1)
    }

    /// The preceding scene, or `None` at the start of the journey.
    pub fn prev(self) -> Option<SceneId> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_first(self) -> bool {
        self == Self::FIRST
    }

    pub fn is_last(self) -> bool {
        self == Self::LAST
    }

    /// Stable lowercase key, also used for audio file names.
    pub fn key(self) -> &'static str {
        match self {
            SceneId::Opening => "opening",
            SceneId::Earth => "earth",
            SceneId::SolarSystem => "solar-system",
            SceneId::MilkyWay => "milky-way",
            SceneId::Universe => "universe",
            SceneId::Final => "final",
        }
    }

    /// Title and message shown in the scene's caption panel.
    pub fn caption(self) -> Caption {
        match self {
            SceneId::Opening => Caption {
                title: "Quanto Eu Te Amo?",
                body: "",
            },
            SceneId::Earth => Caption {
                title: "Escala Planetária",
                body: "Meu amor por você é maior que toda a Terra. Cada continente, cada oceano, \
                       cada montanha e vale são apenas o começo de como te amo.",
            },
            SceneId::SolarSystem => Caption {
                title: "Sistema Solar",
                body: "Meu amor por você é como todo o sistema solar. Cada planeta, cada órbita, \
                       cada movimento celeste é apenas uma fração do que sinto por você.",
            },
            SceneId::MilkyWay => Caption {
                title: "Via Láctea",
                body: "Meu amor por você se estende por toda a Via Láctea. Bilhões de estrelas, \
                       cada uma brilhando com a intensidade do que sinto por você. \
                       Nossa galáxia inteira não é suficiente para conter este amor.",
            },
            SceneId::Universe => Caption {
                title: "Universo",
                body: "Meu amor por você é como o universo inteiro. Infinito, em constante expansão, \
                       cheio de mistérios e maravilhas. Cada galáxia, cada nebulosa, cada partícula \
                       cósmica é apenas um fragmento do que sinto por você.",
            },
            SceneId::Final => Caption {
                title: "Amor Infinito",
                body: "Assim como Cristo demonstrou o maior amor possível ao se entregar pela igreja, \
                       meu amor por você vai além de qualquer medida terrena ou cósmica. \
                       É um amor que transcende o universo, que não conhece limites, \
                       que se renova a cada dia e que durará para sempre.",
            },
        }
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Static copy for a scene's caption panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caption {
    pub title: &'static str,
    pub body: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_walks_forward_and_back() {
        let mut forward = vec![SceneId::FIRST];
        while let Some(next) = forward.last().and_then(|s| s.next()) {
            forward.push(next);
        }
        assert_eq!(forward, SEQUENCE.to_vec());

        let mut backward = vec![SceneId::LAST];
        while let Some(prev) = backward.last().and_then(|s| s.prev()) {
            backward.push(prev);
        }
        backward.reverse();
        assert_eq!(backward, SEQUENCE.to_vec());
    }

    #[test]
    fn ends_have_no_neighbours() {
        assert_eq!(SceneId::Opening.prev(), None);
        assert_eq!(SceneId::Final.next(), None);
        assert!(SceneId::Opening.is_first());
        assert!(SceneId::Final.is_last());
    }

    #[test]
    fn index_round_trips_for_every_scene() {
        for (i, scene) in SEQUENCE.iter().enumerate() {
            assert_eq!(scene.index(), i);
            assert_eq!(SceneId::from_index(i), Some(*scene));
        }
        assert_eq!(SceneId::from_index(SEQUENCE.len()), None);
    }
}
