//! Tabs and switching strategies

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CadenceError;

/// Tab selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    One,
    /// The expensive one (renders 2000 slow posts in the demo)
    Two,
    Three,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::One, Tab::Two, Tab::Three];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::One => "one",
            Tab::Two => "two",
            Tab::Three => "three",
        }
    }

    pub fn is_expensive(&self) -> bool {
        matches!(self, Tab::Two)
    }

    /// What the tab shows once committed
    pub fn content(&self) -> &'static str {
        match self {
            Tab::One => "Tab one",
            Tab::Two => "Posts (hidden for demo purposes)",
            Tab::Three => "Tab three",
        }
    }

    /// Button caption
    pub fn caption(&self) -> &'static str {
        match self {
            Tab::One => "Show tab one",
            Tab::Two => "Show expensive tab",
            Tab::Three => "Show tab three",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "one" => Ok(Tab::One),
            "two" => Ok(Tab::Two),
            "three" => Ok(Tab::Three),
            _ => Err(CadenceError::UnknownTab {
                value: s.to_string(),
            }),
        }
    }
}

/// How a tab switch is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Every switch is an immediate task
    Untransitioned,
    /// Every switch is a transition
    Transitioned,
    /// Transitions, with a loading indicator while pending
    Pending,
    /// Every switch goes through the fixed-delay primitive
    Timeout,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Untransitioned,
        Strategy::Transitioned,
        Strategy::Pending,
        Strategy::Timeout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Untransitioned => "untransitioned",
            Strategy::Transitioned => "transitioned",
            Strategy::Pending => "pending",
            Strategy::Timeout => "timeout",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CadenceError::UnknownStrategy {
                value: s.to_string(),
            })
    }
}

/// State committed by tab switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabState {
    pub shown: Tab,
}

impl Default for TabState {
    fn default() -> Self {
        Self { shown: Tab::One }
    }
}
