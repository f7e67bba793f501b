use std::fmt;

use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserialize, Serialize,
};

use crate::{filter::SessionFilter, record::AttendanceRecord};

#[derive(Debug, PartialEq, Eq)]
pub enum ClientMessage {
    Sub(SessionFilter),
    Submit(AttendanceRecord),
}

impl Serialize for ClientMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ClientMessage::Sub(filter) => serialize_sub(filter, serializer),
            ClientMessage::Submit(record) => serialize_submit(record, serializer),
        }
    }
}

fn serialize_sub<S>(filter: &SessionFilter, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let mut seq = serializer.serialize_seq(Some(2))?;
    seq.serialize_element("SUB")?;
    seq.serialize_element(filter)?;
    seq.end()
}

fn serialize_submit<S>(record: &AttendanceRecord, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let mut seq = serializer.serialize_seq(Some(2))?;
    seq.serialize_element("SUBMIT")?;
    seq.serialize_element(record)?;
    seq.end()
}

impl<'de> Deserialize<'de> for ClientMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(ClientMessageVisitor)
    }
}

struct ClientMessageVisitor;

impl<'de> Visitor<'de> for ClientMessageVisitor {
    type Value = ClientMessage;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a tagged message sequence")
    }

    fn visit_seq<V>(self, mut seq: V) -> Result<ClientMessage, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let kind = seq
            .next_element::<&str>()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        match kind {
            "SUB" => deserialize_sub(&self, &mut seq),
            "SUBMIT" => deserialize_submit(&self, &mut seq),
            _ => Err(de::Error::custom("unknown message kind")),
        }
    }
}

fn deserialize_sub<'de, V>(
    visitor: &ClientMessageVisitor,
    seq: &mut V,
) -> Result<ClientMessage, <V as SeqAccess<'de>>::Error>
where
    V: SeqAccess<'de>,
{
    let filter = seq
        .next_element::<SessionFilter>()?
        .ok_or_else(|| de::Error::invalid_length(1, visitor))?;
    Ok(ClientMessage::Sub(filter))
}

fn deserialize_submit<'de, V>(
    visitor: &ClientMessageVisitor,
    seq: &mut V,
) -> Result<ClientMessage, <V as SeqAccess<'de>>::Error>
where
    V: SeqAccess<'de>,
{
    let record = seq
        .next_element::<AttendanceRecord>()?
        .ok_or_else(|| de::Error::invalid_length(1, visitor))?;
    Ok(ClientMessage::Submit(record))
}

impl From<SessionFilter> for ClientMessage {
    fn from(filter: SessionFilter) -> Self {
        ClientMessage::Sub(filter)
    }
}

impl From<AttendanceRecord> for ClientMessage {
    fn from(record: AttendanceRecord) -> Self {
        ClientMessage::Submit(record)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ServerMessage {
    Attendance(AttendanceRecord),
    Ok(Ack),
    Notice(String),
}

/// Acknowledgement of a SUBMIT. `message` is empty when accepted.
#[derive(Debug, PartialEq, Eq)]
pub struct Ack {
    pub record_id: String,
    pub accepted: bool,
    pub message: String,
}

impl Serialize for ServerMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ServerMessage::Attendance(record) => serialize_attendance(record, serializer),
            ServerMessage::Ok(ack) => serialize_ok(ack, serializer),
            ServerMessage::Notice(message) => serialize_notice(message, serializer),
        }
    }
}

fn serialize_attendance<S>(record: &AttendanceRecord, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let mut seq = serializer.serialize_seq(Some(2))?;
    seq.serialize_element("ATTENDANCE")?;
    seq.serialize_element(record)?;
    seq.end()
}

fn serialize_ok<S>(ack: &Ack, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let mut seq = serializer.serialize_seq(Some(4))?;
    seq.serialize_element("OK")?;
    seq.serialize_element(&ack.record_id)?;
    seq.serialize_element(&ack.accepted)?;
    seq.serialize_element(&ack.message)?;
    seq.end()
}

fn serialize_notice<S>(message: &String, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let mut seq = serializer.serialize_seq(Some(2))?;
    seq.serialize_element("NOTICE")?;
    seq.serialize_element(message)?;
    seq.end()
}

impl<'de> Deserialize<'de> for ServerMessage {
    fn deserialize<D>(deserializer: D) -> Result<ServerMessage, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(ServerMessageVisitor)
    }
}

struct ServerMessageVisitor;

impl<'de> Visitor<'de> for ServerMessageVisitor {
    type Value = ServerMessage;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a tagged message sequence")
    }

    fn visit_seq<V>(self, mut seq: V) -> Result<ServerMessage, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let kind = seq
            .next_element::<&str>()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        match kind {
            "ATTENDANCE" => deserialize_attendance(&self, &mut seq),
            "OK" => deserialize_ok(&self, &mut seq),
            "NOTICE" => deserialize_notice(&self, &mut seq),
            _ => Err(de::Error::custom("unknown message kind")),
        }
    }
}

fn deserialize_attendance<'de, V>(
    visitor: &ServerMessageVisitor,
    seq: &mut V,
) -> Result<ServerMessage, <V as SeqAccess<'de>>::Error>
where
    V: SeqAccess<'de>,
{
    let record = seq
        .next_element::<AttendanceRecord>()?
        .ok_or_else(|| de::Error::invalid_length(1, visitor))?;
    Ok(ServerMessage::Attendance(record))
}

fn deserialize_ok<'de, V>(
    visitor: &ServerMessageVisitor,
    seq: &mut V,
) -> Result<ServerMessage, <V as SeqAccess<'de>>::Error>
where
    V: SeqAccess<'de>,
{
    let record_id = seq
        .next_element::<String>()?
        .ok_or_else(|| de::Error::invalid_length(1, visitor))?;
    let accepted = seq
        .next_element::<bool>()?
        .ok_or_else(|| de::Error::invalid_length(2, visitor))?;
    let message = seq
        .next_element::<String>()?
        .ok_or_else(|| de::Error::invalid_length(3, visitor))?;
    Ok(ServerMessage::Ok(Ack {
        record_id,
        accepted,
        message,
    }))
}

fn deserialize_notice<'de, V>(
    visitor: &ServerMessageVisitor,
    seq: &mut V,
) -> Result<ServerMessage, <V as SeqAccess<'de>>::Error>
where
    V: SeqAccess<'de>,
{
    let message = seq
        .next_element::<String>()?
        .ok_or_else(|| de::Error::invalid_length(1, visitor))?;
    Ok(ServerMessage::Notice(message))
}

#[cfg(test)]
mod tests {
    use super::{Ack, ClientMessage, ServerMessage};
    use crate::{filter::SessionFilter, record::AttendanceRecord};

    fn data_provider_sub<'a>() -> (ClientMessage, &'a str) {
        let filter = SessionFilter::new()
            .lecture_name("Algorithms101")
            .date("2024-05-01")
            .time("10:00");
        let serialized =
            r#"["SUB",{"lecture_name":"Algorithms101","date":"2024-05-01","time":"10:00"}]"#;
        (filter.into(), serialized)
    }

    #[test]
    fn serialize_sub() {
        let (sub, expected) = data_provider_sub();
        assert_eq!(serde_json::to_string(&sub).unwrap(), expected);
    }

    #[test]
    fn deserialize_sub() {
        let (expected, serialized) = data_provider_sub();
        let message: ClientMessage = serde_json::from_str(serialized).unwrap();
        assert_eq!(message, expected);
    }

    #[test]
    fn serialize_empty_sub_omits_absent_fields() {
        let message = ClientMessage::Sub(SessionFilter::new());
        assert_eq!(serde_json::to_string(&message).unwrap(), r#"["SUB",{}]"#);
    }

    fn data_provider_record<'a>() -> (AttendanceRecord, &'a str) {
        let record = AttendanceRecord::new("Ana", "7", "Algorithms101", "2024-05-01", "10:00");
        let serialized = r#"{"student_name":"Ana","roll_no":"7","lecture_name":"Algorithms101","date":"2024-05-01","time":"10:00"}"#;
        (record, serialized)
    }

    #[test]
    fn serialize_submit() {
        let (record, raw_record) = data_provider_record();
        let message = ClientMessage::Submit(record);
        let expected = format!(r#"["SUBMIT",{raw_record}]"#);
        assert_eq!(serde_json::to_string(&message).unwrap(), expected);
    }

    #[test]
    fn deserialize_submit() {
        let (record, raw_record) = data_provider_record();
        let serialized = format!(r#"["SUBMIT",{raw_record}]"#);
        let message: ClientMessage = serde_json::from_str(&serialized).unwrap();
        assert_eq!(message, record.into());
    }

    #[test]
    fn serialize_attendance() {
        let (record, raw_record) = data_provider_record();
        let message = ServerMessage::Attendance(record);
        let expected = format!(r#"["ATTENDANCE",{raw_record}]"#);
        assert_eq!(serde_json::to_string(&message).unwrap(), expected);
    }

    #[test]
    fn deserialize_attendance() {
        let (record, raw_record) = data_provider_record();
        let expected = ServerMessage::Attendance(record);
        let serialized = format!(r#"["ATTENDANCE",{raw_record}]"#);
        let message: ServerMessage = serde_json::from_str(&serialized).unwrap();
        assert_eq!(message, expected);
    }

    fn data_provider_ok<'a>() -> (ServerMessage, &'a str) {
        let ack = Ack {
            record_id: "id".to_string(),
            accepted: true,
            message: "".to_string(),
        };
        let serialized = r#"["OK","id",true,""]"#;
        (ServerMessage::Ok(ack), serialized)
    }

    #[test]
    fn serialize_ok() {
        let (ok, expected) = data_provider_ok();
        assert_eq!(serde_json::to_string(&ok).unwrap(), expected);
    }

    #[test]
    fn deserialize_ok() {
        let (expected, serialized) = data_provider_ok();
        let message: ServerMessage = serde_json::from_str(serialized).unwrap();
        assert_eq!(message, expected);
    }

    #[test]
    fn serialize_notice() {
        let message = ServerMessage::Notice("message".to_string());
        let expected = r#"["NOTICE","message"]"#;
        assert_eq!(serde_json::to_string(&message).unwrap(), expected);
    }

    #[test]
    fn deserialize_notice() {
        let expected = ServerMessage::Notice("message".to_string());
        let serialized = r#"["NOTICE","message"]"#;
        let message: ServerMessage = serde_json::from_str(serialized).unwrap();
        assert_eq!(message, expected);
    }

    #[test]
    fn unknown_kind_rejected() {
        let err = serde_json::from_str::<ClientMessage>(r#"["PING"]"#).unwrap_err();
        assert!(err.to_string().contains("unknown message kind"));
    }
}
