/// Database row types — these map directly to SQLite rows.
/// Distinct from the parley-types wire models to keep the DB layer
/// independent; timestamps stay as stored TEXT and are parsed upstream.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub profile_pic: String,
    pub bio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: Option<String>,
    pub image: Option<String>,
    pub seen: bool,
    pub created_at: String,
}
