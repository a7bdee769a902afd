//! XMLTV serialization.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{Channel, Guide, Programme, xmltv_time};
use crate::domain::AppError;

type XmlWriter = Writer<Vec<u8>>;

/// Render a guide as an indented XMLTV document.
pub fn render_xmltv(guide: &Guide) -> Result<Vec<u8>, AppError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("tv");
    if let Some(generator) = &guide.generator {
        root.push_attribute(("generator-info-name", generator.as_str()));
    }
    emit(&mut writer, Event::Start(root))?;

    for channel in &guide.channels {
        write_channel(&mut writer, channel)?;
    }
    for programme in &guide.programmes {
        write_programme(&mut writer, programme)?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("tv")))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_channel(writer: &mut XmlWriter, channel: &Channel) -> Result<(), AppError> {
    let mut start = BytesStart::new("channel");
    start.push_attribute(("id", channel.id.as_str()));
    emit(writer, Event::Start(start))?;

    for name in &channel.display_names {
        text_element(writer, "display-name", &[], name)?;
    }
    if let Some(icon) = &channel.icon {
        empty_element(writer, "icon", &[("src", icon.as_str())])?;
    }

    emit(writer, Event::End(BytesEnd::new("channel")))
}

fn write_programme(writer: &mut XmlWriter, programme: &Programme) -> Result<(), AppError> {
    let start = xmltv_time(&programme.start);
    let stop = xmltv_time(&programme.stop);
    let mut element = BytesStart::new("programme");
    element.push_attribute(("start", start.as_str()));
    element.push_attribute(("stop", stop.as_str()));
    element.push_attribute(("channel", programme.channel.as_str()));
    emit(writer, Event::Start(element))?;

    let lang: Vec<(&str, &str)> = match &programme.text_lang {
        Some(lang) => vec![("lang", lang.as_str())],
        None => Vec::new(),
    };

    if let Some(title) = &programme.title {
        text_element(writer, "title", &lang, title)?;
    }
    if let Some(sub_title) = &programme.sub_title {
        text_element(writer, "sub-title", &lang, sub_title)?;
    }
    if let Some(desc) = &programme.desc {
        text_element(writer, "desc", &lang, desc)?;
    }
    if let Some(date) = &programme.date {
        text_element(writer, "date", &[], date)?;
    }
    for category in &programme.categories {
        text_element(writer, "category", &[("lang", "en")], category)?;
    }
    if let Some(minutes) = programme.length_minutes {
        text_element(writer, "length", &[("units", "minutes")], &minutes.to_string())?;
    }
    if let Some(icon) = &programme.icon {
        empty_element(writer, "icon", &[("src", icon.as_str())])?;
    }
    if let Some(url) = &programme.url {
        text_element(writer, "url", &[], url)?;
    }
    for episode in &programme.episode_nums {
        let attrs = [("system", episode.system.as_str())];
        text_element(writer, "episode-num", &attrs, &episode.value)?;
    }
    if programme.live {
        empty_element(writer, "live", &[])?;
    }
    if programme.new {
        empty_element(writer, "new", &[])?;
    }
    match &programme.previously_shown {
        Some(Some(start)) => {
            empty_element(writer, "previously-shown", &[("start", start.as_str())])?
        }
        Some(None) => empty_element(writer, "previously-shown", &[])?,
        None => {}
    }
    if programme.audio_stereo {
        empty_element(writer, "audio", &[("type", "stereo")])?;
    }
    if programme.subtitles_teletext {
        empty_element(writer, "subtitles", &[("type", "teletext")])?;
    }
    if let Some(rating) = &programme.rating {
        let mut start = BytesStart::new("rating");
        start.push_attribute(("system", rating.system.as_str()));
        emit(writer, Event::Start(start))?;
        text_element(writer, "value", &[], &rating.value)?;
        emit(writer, Event::End(BytesEnd::new("rating")))?;
    }

    emit(writer, Event::End(BytesEnd::new("programme")))
}

fn text_element(
    writer: &mut XmlWriter,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<(), AppError> {
    let mut start = BytesStart::new(name);
    for attr in attrs {
        start.push_attribute(*attr);
    }
    emit(writer, Event::Start(start))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn empty_element(
    writer: &mut XmlWriter,
    name: &str,
    attrs: &[(&str, &str)],
) -> Result<(), AppError> {
    let mut start = BytesStart::new(name);
    for attr in attrs {
        start.push_attribute(*attr);
    }
    emit(writer, Event::Empty(start))
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), AppError> {
    writer.write_event(event).map_err(|e| AppError::Xml(e.to_string()))
}
