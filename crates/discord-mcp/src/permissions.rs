//! Decoding of Discord permission bitsets into readable names.
//!
//! Role permissions and channel overwrites arrive as string-encoded u64
//! bitsets; tool outputs render the set bits as lowercase permission names.

/// Bit position and name for every documented permission.
const PERMISSIONS: &[(u32, &str)] = &[
    (0, "create_instant_invite"),
    (1, "kick_members"),
    (2, "ban_members"),
    (3, "administrator"),
    (4, "manage_channels"),
    (5, "manage_guild"),
    (6, "add_reactions"),
    (7, "view_audit_log"),
    (8, "priority_speaker"),
    (9, "stream"),
    (10, "view_channel"),
    (11, "send_messages"),
    (12, "send_tts_messages"),
    (13, "manage_messages"),
    (14, "embed_links"),
    (15, "attach_files"),
    (16, "read_message_history"),
    (17, "mention_everyone"),
    (18, "use_external_emojis"),
    (19, "view_guild_insights"),
    (20, "connect"),
    (21, "speak"),
    (22, "mute_members"),
    (23, "deafen_members"),
    (24, "move_members"),
    (25, "use_voice_activation"),
    (26, "change_nickname"),
    (27, "manage_nicknames"),
    (28, "manage_roles"),
    (29, "manage_webhooks"),
    (30, "manage_expressions"),
    (31, "use_application_commands"),
    (32, "request_to_speak"),
    (33, "manage_events"),
    (34, "manage_threads"),
    (35, "create_public_threads"),
    (36, "create_private_threads"),
    (37, "use_external_stickers"),
    (38, "send_messages_in_threads"),
    (39, "use_embedded_activities"),
    (40, "moderate_members"),
];

/// Names of all permissions set in `bits`, in documented bit order.
pub fn permission_names(bits: u64) -> Vec<&'static str> {
    PERMISSIONS
        .iter()
        .filter(|(bit, _)| bits & (1u64 << bit) != 0)
        .map(|(_, name)| *name)
        .collect()
}

/// Comma-joined permission names, or `"None"` for an empty bitset.
pub fn permission_list(bits: u64) -> String {
    let names = permission_names(bits);
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}
