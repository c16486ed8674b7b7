//! XMLTV rendering.
//!
//! Every channel is written once as is and once more per extra hour shift,
//! as `<id>-<shift>` / `<name> +<shift>`, with programme times moved by the
//! same number of hours. Players use the shifted copies for "+1" channels.

use chrono::{DateTime, Duration, FixedOffset};
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use super::model::{EpgChannel, Programme};
use crate::{Error, Result, config::XmltvConfig};

const TIME_FORMAT: &str = "%Y%m%d%H%M%S %z";

pub struct XmltvWriter {
    config: XmltvConfig,
}

impl XmltvWriter {
    pub fn new(config: XmltvConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &XmltvConfig {
        &self.config
    }

    /// Render with the configured shifts.
    pub fn write(&self, channels: &[EpgChannel]) -> Result<String> {
        self.write_with_shifts(channels, &self.config.shifts)
    }

    pub fn write_with_shifts(&self, channels: &[EpgChannel], shifts: &[i64]) -> Result<String> {
        let shifts = normalize_shifts(shifts);
        tracing::info!("Creating XMLTV for {} channels", channels.len());
        tracing::debug!("Shift hours {:?}", shifts);

        let mut doc = Document::new();
        doc.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        doc.start(
            "tv",
            &[
                ("source-info-name", self.config.source_info_name.as_str()),
                ("generator-info-name", self.config.generator_info_name.as_str()),
                ("generator-info-url", self.config.generator_info_url.as_str()),
            ],
        )?;

        for channel in channels {
            for &shift in &shifts {
                self.write_channel(&mut doc, channel, shift)?;
            }
        }

        for channel in channels {
            for &shift in &shifts {
                let channel_id = shifted_id(channel, shift);
                for programme in channel.programmes() {
                    self.write_programme(&mut doc, programme, &channel_id, shift)?;
                }
            }
        }

        doc.end("tv")?;
        doc.finish()
    }

    fn write_channel(&self, doc: &mut Document, channel: &EpgChannel, shift: i64) -> Result<()> {
        let lang = self.config.lang.as_str();
        let id = shifted_id(channel, shift);
        let name = if shift == 0 {
            channel.name.clone()
        } else {
            format!("{} +{}", channel.name, shift)
        };
        let number = channel.number.as_deref().filter(|_| shift == 0);

        let mut attrs = vec![("id", id.as_str()), ("name", name.as_str())];
        if let Some(number) = number {
            attrs.push(("number", number));
        }
        doc.start("channel", &attrs)?;

        doc.text_element("display-name", &[("lang", lang)], &name)?;
        if let Some(number) = number {
            doc.text_element("display-name", &[("lang", lang)], number)?;
        }
        if let Some(logo) = &channel.logo {
            doc.empty("icon", &[("src", logo.as_str())])?;
        }
        if let Some(url) = &channel.url {
            doc.text_element("url", &[], url)?;
        }

        doc.end("channel")
    }

    fn write_programme(
        &self,
        doc: &mut Document,
        programme: &Programme,
        channel_id: &str,
        shift: i64,
    ) -> Result<()> {
        let lang = self.config.lang.as_str();
        let start = format_time(programme.start, shift);
        let stop = format_time(programme.stop, shift);

        doc.start(
            "programme",
            &[
                ("start", start.as_str()),
                ("stop", stop.as_str()),
                ("channel", channel_id),
            ],
        )?;

        if let Some(id) = &programme.id {
            doc.text_element("id", &[], id)?;
        }
        if let Some(pid) = &programme.pid {
            doc.text_element("pid", &[], pid)?;
        }

        let title = if programme.prima {
            format!("{} 1^TV", programme.title)
        } else {
            programme.title.clone()
        };
        doc.text_element("title", &[("lang", lang)], &title)?;

        for category in [&programme.genre, &programme.subgenre].into_iter().flatten() {
            doc.text_element("category", &[("lang", lang)], category)?;
        }
        if let Some(poster) = &programme.poster {
            doc.empty("icon", &[("src", poster.as_str())])?;
        }
        if let Some(description) = &programme.description {
            doc.text_element("desc", &[("lang", lang)], description)?;
        }
        doc.text_element("country", &[], &self.config.country)?;
        if let Some(subtitle) = &programme.data.desc {
            doc.text_element("sub-title", &[("lang", lang)], subtitle)?;
        }
        doc.empty("credits", &[])?;
        if let Some(episode) = &programme.episode {
            doc.text_element("episode-num", &[("system", "onscreen")], episode)?;
        }

        doc.end("programme")
    }
}

/// Unshifted first, then each extra shift once.
fn normalize_shifts(shifts: &[i64]) -> Vec<i64> {
    let mut out = vec![0];
    for &shift in shifts {
        if !out.contains(&shift) {
            out.push(shift);
        }
    }
    out
}

fn shifted_id(channel: &EpgChannel, shift: i64) -> String {
    if shift == 0 {
        channel.id_epg.clone()
    } else {
        format!("{}-{}", channel.id_epg, shift)
    }
}

fn format_time(time: DateTime<FixedOffset>, shift: i64) -> String {
    (time + Duration::hours(shift)).format(TIME_FORMAT).to_string()
}

/// Thin wrapper over the quick-xml writer.
struct Document {
    writer: Writer<Vec<u8>>,
}

impl Document {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::Xmltv(e.to_string()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.emit(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.emit(Event::Empty(element))
    }

    fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.emit(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| Error::Xmltv(e.to_string()))
    }
}
