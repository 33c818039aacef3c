//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Registered accounts for every role.
    users (id) {
        id -> Uuid,
        /// Lower-cased login email, unique.
        email -> Varchar,
        name -> Varchar,
        /// Wire role label: `admin`, `pendonor`, or `pemohon`.
        role -> Varchar,
        password_hash -> Text,
        /// Present for donors only.
        blood_type -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
        address -> Nullable<Text>,
        registered_at -> Timestamptz,
    }
}

diesel::table! {
    /// Completed and scheduled donations.
    donor_records (id) {
        id -> Uuid,
        donor_id -> Uuid,
        donated_at -> Timestamptz,
        location -> Varchar,
        note -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per blood type.
    blood_stocks (blood_type) {
        blood_type -> Varchar,
        quantity -> Int4,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Requests for blood bags and their lifecycle status.
    blood_requests (id) {
        id -> Uuid,
        requester_id -> Uuid,
        patient_name -> Varchar,
        blood_type -> Varchar,
        quantity -> Int4,
        justification -> Text,
        /// Wire status label: `Pending`, `Disetujui`, `Ditolak`, or `Selesai`.
        status -> Varchar,
        admin_note -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(donor_records -> users (donor_id));
diesel::joinable!(blood_requests -> users (requester_id));

diesel::allow_tables_to_appear_in_same_query!(users, donor_records, blood_stocks, blood_requests);
