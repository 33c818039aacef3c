//! Deterministic message templates.
//!
//! Every intent has a network-free fallback that is complete on its own. The
//! weekly digest only ever uses its template.

use super::{NotificationIntent, RenderedMessage, WeeklyDigestSummary};
use crate::domain::BloodType;
use crate::domain::date_format::{day_month, indonesian_date};

const HOSPITAL: &str = "RS Sentra Medika Minahasa Utara";
const UNKNOWN_BLOOD_TYPE: &str = "Unknown";

fn blood_label(blood_type: Option<BloodType>) -> &'static str {
    blood_type.map_or(UNKNOWN_BLOOD_TYPE, BloodType::as_str)
}

/// Fallback subject and body for `intent`.
pub fn fallback_message(intent: &NotificationIntent) -> RenderedMessage {
    match intent {
        NotificationIntent::LowStock {
            blood_type,
            quantity,
            status,
        } => low_stock(blood_type.as_str(), *quantity, status.as_str()),
        NotificationIntent::Reminder {
            donor_name,
            blood_type,
            days_until,
            date,
            location,
        } => reminder(
            donor_name,
            blood_label(*blood_type),
            &indonesian_date(*date),
            location,
            *days_until,
        ),
        NotificationIntent::ThankYou {
            donor_name,
            blood_type,
            total_donations,
        } => thank_you(donor_name, blood_label(*blood_type), *total_donations),
        NotificationIntent::WeeklyDigest(summary) => weekly_digest(summary),
    }
}

fn low_stock(blood_type: &str, quantity: u32, status: &str) -> RenderedMessage {
    let status_upper = status.to_uppercase();
    RenderedMessage {
        subject: format!("⚠️ URGENT: Stok Darah {blood_type} {status}!"),
        body: format!(
            "Kepada Admin RS Sentra Medika,\n\n\
             Kami informasikan bahwa stok darah golongan {blood_type} saat ini dalam kondisi {status_upper}.\n\n\
             Detail Stok:\n\
             • Golongan Darah: {blood_type}\n\
             • Jumlah Kantong: {quantity}\n\
             • Status: {status}\n\n\
             Tindakan yang diperlukan:\n\
             1. Segera hubungi pendonor aktif golongan {blood_type}\n\
             2. Koordinasi dengan PMI untuk penambahan stok\n\
             3. Update status ke semua unit terkait\n\n\
             Mohon segera ditindaklanjuti untuk memastikan ketersediaan darah bagi pasien yang membutuhkan.\n\n\
             Terima kasih,\n\
             Sistem Manajemen Donor Darah\n\
             {HOSPITAL}"
        ),
    }
}

fn reminder(
    donor_name: &str,
    blood_type: &str,
    date: &str,
    location: &str,
    days_until: i64,
) -> RenderedMessage {
    RenderedMessage {
        subject: format!("🩸 Pengingat: Jadwal Donor Darah {days_until} Hari Lagi"),
        body: format!(
            "Halo {donor_name},\n\n\
             Terima kasih telah mendaftar sebagai pendonor darah di RS Sentra Medika!\n\n\
             Detail Jadwal Donor Anda:\n\
             📅 Tanggal: {date}\n\
             📍 Lokasi: {location}\n\
             🩸 Golongan Darah: {blood_type}\n\
             ⏰ Waktu: 08:00 - 14:00 WIB\n\n\
             Persiapan Sebelum Donor:\n\
             ✓ Istirahat cukup (minimal 5 jam)\n\
             ✓ Makan makanan bergizi\n\
             ✓ Minum air putih yang cukup\n\
             ✓ Hindari makanan berlemak\n\
             ✓ Bawa KTP/identitas\n\n\
             Kontribusi Anda sangat berarti untuk menyelamatkan nyawa!\n\n\
             Jika berhalangan hadir, mohon informasikan kami minimal 1 hari sebelumnya.\n\n\
             Salam sehat,\n\
             Tim {HOSPITAL}\n\
             📞 Kontak: (0431) 123456"
        ),
    }
}

fn thank_you(donor_name: &str, blood_type: &str, total_donations: usize) -> RenderedMessage {
    RenderedMessage {
        subject: "💝 Terima Kasih, Pahlawan Tanpa Tanda Jasa!".to_owned(),
        body: format!(
            "Kepada Yth. {donor_name},\n\n\
             Terima kasih atas donasi darah Anda! Ini adalah donasi ke-{total_donations} Anda.\n\n\
             Detail Donasi:\n\
             🩸 Golongan Darah: {blood_type}\n\
             📊 Total Donasi: {total_donations} kali\n\
             🏆 Status: Pendonor Aktif\n\n\
             Tahukah Anda?\n\
             Satu kantong darah dapat menyelamatkan hingga 3 nyawa! Kontribusi Anda sangat berarti.\n\n\
             Informasi Penting:\n\
             • Anda dapat donor kembali 3 bulan dari sekarang\n\
             • Kami akan mengirimkan pengingat saat Anda sudah eligible\n\
             • Jaga kesehatan dan pola makan yang baik\n\n\
             Tips Setelah Donor:\n\
             ✓ Istirahat 10-15 menit\n\
             ✓ Minum banyak air putih\n\
             ✓ Hindari aktivitas berat 24 jam\n\
             ✓ Konsumsi makanan bergizi\n\n\
             Sekali lagi, terima kasih atas kebaikan Anda!\n\n\
             Hormat kami,\n\
             {HOSPITAL}"
        ),
    }
}

fn weekly_digest(summary: &WeeklyDigestSummary) -> RenderedMessage {
    let stock_notice = if summary.critical_stocks > 0 {
        "⚠️ PERHATIAN: Ada stok darah yang kritis! Mohon segera ditindaklanjuti."
    } else {
        "✅ Semua stok darah dalam kondisi baik."
    };
    RenderedMessage {
        subject: format!(
            "📊 Ringkasan Mingguan - {}",
            indonesian_date(summary.report_date)
        ),
        body: format!(
            "Ringkasan Mingguan Sistem Donor Darah\n\
             {HOSPITAL}\n\n\
             📈 Statistik Minggu Lalu ({start} - {end}):\n\
             • Total Donasi: {donations} donor\n\
             • Stok Kritis: {critical} golongan darah\n\
             • Stok Menipis: {low} golongan darah\n\n\
             📅 Jadwal Minggu Depan:\n\
             • Donor Terjadwal: {upcoming} orang\n\n\
             {stock_notice}\n\n\
             Terima kasih atas dedikasi Anda dalam mengelola donor darah.\n\n\
             Salam,\n\
             Sistem Manajemen Donor Darah",
            start = day_month(summary.period_start),
            end = day_month(summary.report_date),
            donations = summary.donations_last_week,
            critical = summary.critical_stocks,
            low = summary.low_stocks,
            upcoming = summary.upcoming_donations,
        ),
    }
}

/// Wrap a plain-text body in the hospital HTML layout.
///
/// The body is HTML-escaped and newlines become `<br>`.
pub fn html_document(body: &str) -> String {
    let content = escape_html(body).replace('\n', "<br>");
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 600px;
            margin: 0 auto;
            padding: 20px;
        }}
        .header {{
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: white;
            padding: 20px;
            border-radius: 10px 10px 0 0;
            text-align: center;
        }}
        .content {{
            background: #f8f9fa;
            padding: 30px;
            border-radius: 0 0 10px 10px;
        }}
        .footer {{
            text-align: center;
            margin-top: 20px;
            color: #666;
            font-size: 12px;
        }}
    </style>
</head>
<body>
    <div class="header">
        <h2>🏥 {HOSPITAL}</h2>
    </div>
    <div class="content">
        {content}
    </div>
    <div class="footer">
        <p>Email ini dikirim secara otomatis oleh Sistem Manajemen Donor Darah</p>
        <p>{HOSPITAL}</p>
    </div>
</body>
</html>
"#
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
