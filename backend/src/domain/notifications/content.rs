//! Prompts for the content generator and parsing of its replies.

use super::{NotificationIntent, RenderedMessage};
use crate::domain::BloodType;
use crate::domain::date_format::indonesian_date;

const SUBJECT_PREFIX: &str = "SUBJECT:";
const BODY_PREFIX: &str = "BODY:";
const OUTPUT_FORMAT: &str =
    "Format output:\nSUBJECT: [tulis subject email]\nBODY: [tulis isi email]";

/// Prompt for `intent`, or `None` when the intent is template-only.
pub fn prompt_for(intent: &NotificationIntent) -> Option<String> {
    match intent {
        NotificationIntent::LowStock {
            blood_type,
            quantity,
            status,
        } => Some(format!(
            "Buatkan email notifikasi untuk admin rumah sakit tentang stok darah yang {status_lower}.\n\n\
             Detail:\n\
             - Golongan Darah: {blood_type}\n\
             - Stok Saat Ini: {quantity} kantong\n\
             - Status: {status}\n\n\
             Email harus:\n\
             1. Profesional dan urgent\n\
             2. Dalam Bahasa Indonesia\n\
             3. Menyertakan call-to-action untuk menghubungi donor\n\
             4. Ramah namun tegas\n\
             5. Maksimal 200 kata\n\n\
             {OUTPUT_FORMAT}",
            status_lower = status.as_str().to_lowercase(),
        )),
        NotificationIntent::Reminder {
            donor_name,
            blood_type,
            days_until,
            date,
            location,
        } => Some(format!(
            "Buatkan email pengingat donor darah untuk pendonor yang akan mendonor dalam {days_until} hari.\n\n\
             Detail:\n\
             - Nama Pendonor: {donor_name}\n\
             - Golongan Darah: {blood}\n\
             - Tanggal Donor: {formatted}\n\
             - Lokasi: {location}\n\n\
             Email harus:\n\
             1. Ramah dan menghargai kontribusi pendonor\n\
             2. Dalam Bahasa Indonesia\n\
             3. Menyertakan tips persiapan sebelum donor\n\
             4. Informasi kontak jika perlu reschedule\n\
             5. Motivasi tentang pentingnya donor darah\n\
             6. Maksimal 250 kata\n\n\
             {OUTPUT_FORMAT}",
            blood = blood_type.map_or("Unknown", BloodType::as_str),
            formatted = indonesian_date(*date),
        )),
        NotificationIntent::ThankYou {
            donor_name,
            blood_type,
            total_donations,
        } => Some(format!(
            "Buatkan email terima kasih setelah donor darah berhasil dilakukan.\n\n\
             Detail:\n\
             - Nama Pendonor: {donor_name}\n\
             - Golongan Darah: {blood}\n\
             - Total Donasi: {total_donations} kali\n\n\
             Email harus:\n\
             1. Sangat menghargai dan warm\n\
             2. Dalam Bahasa Indonesia\n\
             3. Menyebutkan dampak positif dari donor darah\n\
             4. Informasi kapan bisa donor lagi (3 bulan)\n\
             5. Ajakan untuk terus menjadi pendonor rutin\n\
             6. Maksimal 200 kata\n\n\
             {OUTPUT_FORMAT}",
            blood = blood_type.map_or("Unknown", BloodType::as_str),
        )),
        NotificationIntent::WeeklyDigest(_) => None,
    }
}

/// Extract subject and body from generated text.
///
/// The subject is the rest of the first line starting with `SUBJECT:`. The
/// body is everything after the first line starting with `BODY:`, including
/// any text on that line after the marker. Returns `None` when either part is
/// missing or blank.
///
/// # Examples
/// ```
/// use donor_backend::domain::notifications::parse_generated;
///
/// let parsed = parse_generated("SUBJECT: Halo\nBODY:\nIsi email").unwrap();
/// assert_eq!(parsed.subject, "Halo");
/// assert_eq!(parsed.body, "Isi email");
/// assert!(parse_generated("no markers here").is_none());
/// ```
pub fn parse_generated(text: &str) -> Option<RenderedMessage> {
    let lines: Vec<&str> = text.trim().lines().collect();
    let subject = lines
        .iter()
        .find_map(|line| line.trim_start().strip_prefix(SUBJECT_PREFIX))
        .map(str::trim)
        .filter(|subject| !subject.is_empty())?;

    let body_index = lines
        .iter()
        .position(|line| line.trim_start().starts_with(BODY_PREFIX))?;
    let inline = lines
        .get(body_index)
        .and_then(|line| line.trim_start().strip_prefix(BODY_PREFIX))
        .map(str::trim)
        .filter(|rest| !rest.is_empty());
    let following = lines.get(body_index + 1..).unwrap_or_default();
    let body = inline
        .into_iter()
        .chain(following.iter().copied())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned();
    if body.is_empty() {
        return None;
    }

    Some(RenderedMessage {
        subject: subject.to_owned(),
        body,
    })
}
