use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Stat,
    ChartLine,
    ChartPie,
    ChartBar,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardColor {
    Orange,
    Cyan,
    Green,
    Emerald,
    Blue,
    Yellow,
    Red,
    Gray,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSegment {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarFactor {
    pub name: String,
    pub actual: f64,
    pub optimal: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ListItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
}

/// Payload of a card. The variant decides `card_type` on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum CardData {
    Stat,
    ChartLine {
        points: Vec<ChartPoint>,
        unit: String,
    },
    ChartPie {
        segments: Vec<PieSegment>,
    },
    ChartBar {
        factors: Vec<BarFactor>,
    },
    List {
        items: Vec<ListItem>,
    },
}

impl CardData {
    pub fn card_type(&self) -> CardType {
        match self {
            CardData::Stat => CardType::Stat,
            CardData::ChartLine { .. } => CardType::ChartLine,
            CardData::ChartPie { .. } => CardType::ChartPie,
            CardData::ChartBar { .. } => CardType::ChartBar,
            CardData::List { .. } => CardType::List,
        }
    }
}

#[derive(Serialize)]
struct LinePayload<'a> {
    points: &'a [ChartPoint],
    unit: &'a str,
}

#[derive(Serialize)]
struct PiePayload<'a> {
    segments: &'a [PieSegment],
}

#[derive(Serialize)]
struct BarPayload<'a> {
    factors: &'a [BarFactor],
}

#[derive(Serialize)]
struct ListPayload<'a> {
    items: &'a [ListItem],
}

/// Declarative description of one dashboard card. Nothing here renders.
#[derive(Debug, Clone, PartialEq)]
pub struct UIInstruction {
    pub title: String,
    pub value: String,
    pub subtitle: String,
    pub color: CardColor,
    pub data: CardData,
}

impl UIInstruction {
    pub fn new(
        title: impl Into<String>,
        value: impl Into<String>,
        subtitle: impl Into<String>,
        color: CardColor,
        data: CardData,
    ) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            subtitle: subtitle.into(),
            color,
            data,
        }
    }

    pub fn stat(
        title: impl Into<String>,
        value: impl Into<String>,
        subtitle: impl Into<String>,
        color: CardColor,
    ) -> Self {
        Self::new(title, value, subtitle, color, CardData::Stat)
    }

    pub fn card_type(&self) -> CardType {
        self.data.card_type()
    }
}

impl Serialize for UIInstruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let has_data = !matches!(self.data, CardData::Stat);
        let mut state =
            serializer.serialize_struct("UIInstruction", if has_data { 6 } else { 5 })?;
        state.serialize_field("card_type", &self.card_type())?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("subtitle", &self.subtitle)?;
        state.serialize_field("color", &self.color)?;
        match &self.data {
            CardData::Stat => state.skip_field("data")?,
            CardData::ChartLine { points, unit } => {
                state.serialize_field("data", &LinePayload { points, unit })?
            }
            CardData::ChartPie { segments } => {
                state.serialize_field("data", &PiePayload { segments })?
            }
            CardData::ChartBar { factors } => {
                state.serialize_field("data", &BarPayload { factors })?
            }
            CardData::List { items } => state.serialize_field("data", &ListPayload { items })?,
        }
        state.end()
    }
}
