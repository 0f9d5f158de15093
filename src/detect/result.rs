use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Closed label set of the MobileNet-SSD (Pascal VOC) detector.
///
/// Discriminants are the network's label indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Background = 0,
    Aeroplane = 1,
    Bicycle = 2,
    Bird = 3,
    Boat = 4,
    Bottle = 5,
    Bus = 6,
    Car = 7,
    Cat = 8,
    Chair = 9,
    Cow = 10,
    DiningTable = 11,
    Dog = 12,
    Horse = 13,
    Motorbike = 14,
    Person = 15,
    PottedPlant = 16,
    Sheep = 17,
    Sofa = 18,
    Train = 19,
    TvMonitor = 20,
}

impl Label {
    pub const ALL: [Label; 21] = [
        Label::Background,
        Label::Aeroplane,
        Label::Bicycle,
        Label::Bird,
        Label::Boat,
        Label::Bottle,
        Label::Bus,
        Label::Car,
        Label::Cat,
        Label::Chair,
        Label::Cow,
        Label::DiningTable,
        Label::Dog,
        Label::Horse,
        Label::Motorbike,
        Label::Person,
        Label::PottedPlant,
        Label::Sheep,
        Label::Sofa,
        Label::Train,
        Label::TvMonitor,
    ];

    pub fn from_index(index: usize) -> Option<Label> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Label::Background => "background",
            Label::Aeroplane => "aeroplane",
            Label::Bicycle => "bicycle",
            Label::Bird => "bird",
            Label::Boat => "boat",
            Label::Bottle => "bottle",
            Label::Bus => "bus",
            Label::Car => "car",
            Label::Cat => "cat",
            Label::Chair => "chair",
            Label::Cow => "cow",
            Label::DiningTable => "diningtable",
            Label::Dog => "dog",
            Label::Horse => "horse",
            Label::Motorbike => "motorbike",
            Label::Person => "person",
            Label::PottedPlant => "pottedplant",
            Label::Sheep => "sheep",
            Label::Sofa => "sofa",
            Label::Train => "train",
            Label::TvMonitor => "tvmonitor",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Label {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.name() == wanted)
            .ok_or_else(|| anyhow!("unknown label '{}'", s))
    }
}

/// Bounding box in normalized 0..1 coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

/// One detection record as produced by the network.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub image_id: u32,
    pub label: Label,
    pub confidence: f32,
    pub bbox: NormBox,
}
