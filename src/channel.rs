//! Channel registry and switching.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Deserialize;

use crate::error::{Result, TvError};
use crate::overlay::OverlayContent;
use crate::timer::{cancel_slot, TaskHandle, Timers};

/// Label shown when switching to a channel that does not exist.
pub const UNKNOWN_CHANNEL_LABEL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Video,
    Teletext,
}

/// One entry of the channel configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelRecord {
    #[serde(default)]
    pub number: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelContent {
    Video { source: String },
    Teletext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDefinition {
    pub number: u32,
    pub name: String,
    pub content: ChannelContent,
    pub link: Option<String>,
    /// Seconds; only meaningful for video channels.
    pub last_playback_position: f64,
}

impl ChannelDefinition {
    pub fn is_video(&self) -> bool {
        matches!(self.content, ChannelContent::Video { .. })
    }
}

impl TryFrom<ChannelRecord> for ChannelDefinition {
    type Error = TvError;

    fn try_from(record: ChannelRecord) -> Result<Self> {
        let content = match record.kind {
            ChannelKind::Teletext => ChannelContent::Teletext,
            ChannelKind::Video => match record.video {
                Some(source) if !source.is_empty() => ChannelContent::Video { source },
                _ => {
                    return Err(TvError::MissingVideoSource {
                        number: record.number,
                    })
                }
            },
        };
        Ok(Self {
            number: record.number,
            name: record.name,
            content,
            link: record.link,
            last_playback_position: 0.0,
        })
    }
}

/// Fixed set of channels keyed by number.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: BTreeMap<u32, ChannelDefinition>,
}

impl ChannelRegistry {
    /// Records without a number are skipped with a warning; anything else
    /// that is malformed rejects the whole list.
    pub fn from_records(records: Vec<ChannelRecord>) -> Result<Self> {
        let mut channels = BTreeMap::new();
        for record in records {
            if record.number == 0 {
                log::warn!("skipping channel {:?}: missing number", record.name);
                continue;
            }
            let channel = ChannelDefinition::try_from(record)?;
            let number = channel.number;
            if channels.insert(number, channel).is_some() {
                return Err(TvError::DuplicateChannel { number });
            }
        }
        if channels.is_empty() {
            return Err(TvError::NoChannels);
        }
        Ok(Self { channels })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let records: Vec<ChannelRecord> =
            serde_json::from_str(text).map_err(TvError::InvalidConfig)?;
        Self::from_records(records)
    }

    pub fn get(&self, number: u32) -> Option<&ChannelDefinition> {
        self.channels.get(&number)
    }

    fn get_mut(&mut self, number: u32) -> Option<&mut ChannelDefinition> {
        self.channels.get_mut(&number)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelDefinition> {
        self.channels.values()
    }
}

/// The single video element. Only [`ChannelSwitcher`] writes to it.
pub trait VideoSurface {
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    fn source(&self) -> String;
    fn set_source(&self, source: &str);
    fn set_visible(&self, visible: bool);
    fn pause(&self);
}

/// Overlay operations the switcher needs.
pub trait OverlayControl {
    fn show(&self);
    fn hide(&self);
    fn set_content(&self, content: OverlayContent);
}

/// Reflects the current channel in the page (buttons, links).
pub trait ChannelIndicator {
    fn highlight(&self, channel: Option<&ChannelDefinition>, number: u32);
}

pub struct ChannelSwitcher {
    registry: ChannelRegistry,
    current: u32,
    label_hide_ms: u32,
    video: Rc<dyn VideoSurface>,
    teletext: Rc<dyn OverlayControl>,
    label: Rc<dyn OverlayControl>,
    indicator: Rc<dyn ChannelIndicator>,
    timers: Rc<dyn Timers>,
    label_hide: Option<TaskHandle>,
}

impl ChannelSwitcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: ChannelRegistry,
        initial: u32,
        label_hide_ms: u32,
        video: Rc<dyn VideoSurface>,
        teletext: Rc<dyn OverlayControl>,
        label: Rc<dyn OverlayControl>,
        indicator: Rc<dyn ChannelIndicator>,
        timers: Rc<dyn Timers>,
    ) -> Self {
        Self {
            registry,
            current: initial,
            label_hide_ms,
            video,
            teletext,
            label,
            indicator,
            timers,
            label_hide: None,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn switch_to(&mut self, number: u32) {
        let video = self.video.clone();
        if let Some(current) = self.registry.get_mut(self.current) {
            // Nothing is loaded yet on the very first switch.
            if current.is_video() && !video.source().is_empty() {
                current.last_playback_position = video.current_time();
            }
        }

        let label = match self.registry.get(number) {
            Some(target) => {
                match &target.content {
                    ChannelContent::Teletext => {
                        self.teletext.show();
                        video.set_visible(false);
                        video.pause();
                    }
                    ChannelContent::Video { source } => {
                        self.teletext.hide();
                        video.set_visible(true);
                        video.set_source(source);
                        video.set_current_time(target.last_playback_position);
                    }
                }
                target.name.clone()
            }
            None => {
                log::warn!("channel {number} not found");
                video.set_source("");
                video.set_visible(true);
                self.teletext.hide();
                UNKNOWN_CHANNEL_LABEL.to_string()
            }
        };

        self.show_label(label);
        self.indicator.highlight(self.registry.get(number), number);
        self.current = number;
    }

    fn show_label(&mut self, text: String) {
        self.label.set_content(OverlayContent::Text(text));
        self.label.show();

        cancel_slot(self.timers.as_ref(), &mut self.label_hide);
        let label = self.label.clone();
        self.label_hide = Some(
            self.timers
                .schedule(self.label_hide_ms, Box::new(move || label.hide())),
        );
    }

    pub fn dispose(&mut self) {
        cancel_slot(self.timers.as_ref(), &mut self.label_hide);
    }
}

impl Drop for ChannelSwitcher {
    fn drop(&mut self) {
        self.dispose();
    }
}
