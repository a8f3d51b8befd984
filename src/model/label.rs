#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Label {
    #[default]
    Normal,
    Anomalous,
}

impl Label {
    /// Output encoding: `1` for normal rows, `-1` for anomalous rows.
    pub fn code(self) -> i8 {
        match self {
            Label::Normal => 1,
            Label::Anomalous => -1,
        }
    }

    pub fn is_anomalous(self) -> bool {
        self == Label::Anomalous
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

pub fn count_anomalous(labels: &[Label]) -> usize {
    labels.iter().filter(|l| l.is_anomalous()).count()
}
