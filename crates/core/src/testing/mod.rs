//! Testing utilities and mock implementations of the external services.
//!
//! The ingest pipeline and the HTTP server can be exercised end to end
//! without Telegram or GitHub.
//!
//! # Example
//!
//! ```rust,ignore
//! use tgcatalog_core::testing::{fixtures, MockBotApi, MockContentStore};
//!
//! let bot = MockBotApi::new();
//! bot.add_file("BQAC", fixtures::sample_torrent("Movie.2020.mkv", 1024)).await;
//!
//! let store = MockContentStore::new();
//! store.insert_file("catalog.json", b"[]").await;
//! ```

mod mock_bot_api;
mod mock_content_store;

pub use mock_bot_api::MockBotApi;
pub use mock_content_store::{MockContentStore, RecordedWrite};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::telegram::{Chat, Document, Message, Update};

    fn bstr(out: &mut Vec<u8>, value: &[u8]) {
        out.extend_from_slice(format!("{}:", value.len()).as_bytes());
        out.extend_from_slice(value);
    }

    /// Assemble a `.torrent` file around raw `info` dictionary bytes.
    ///
    /// `info` is inserted verbatim so tests can hash exactly what they wrote.
    pub fn torrent_bytes(
        info: &[u8],
        announce: Option<&str>,
        announce_list: Option<&[Vec<&str>]>,
    ) -> Vec<u8> {
        let mut out = b"d".to_vec();
        if let Some(announce) = announce {
            bstr(&mut out, b"announce");
            bstr(&mut out, announce.as_bytes());
        }
        if let Some(tiers) = announce_list {
            bstr(&mut out, b"announce-list");
            out.push(b'l');
            for tier in tiers {
                out.push(b'l');
                for url in tier {
                    bstr(&mut out, url.as_bytes());
                }
                out.push(b'e');
            }
            out.push(b'e');
        }
        bstr(&mut out, b"info");
        out.extend_from_slice(info);
        out.push(b'e');
        out
    }

    /// Bencoded single-file `info` dictionary, keys in canonical order.
    pub fn single_file_info(name: &str, length: i64) -> Vec<u8> {
        let mut out = b"d".to_vec();
        bstr(&mut out, b"length");
        out.extend_from_slice(format!("i{}e", length).as_bytes());
        bstr(&mut out, b"name");
        bstr(&mut out, name.as_bytes());
        bstr(&mut out, b"piece length");
        out.extend_from_slice(b"i16384e");
        bstr(&mut out, b"pieces");
        bstr(&mut out, &[0xab; 20]);
        out.push(b'e');
        out
    }

    /// A complete single-file torrent with one tracker.
    pub fn sample_torrent(name: &str, length: i64) -> Vec<u8> {
        torrent_bytes(
            &single_file_info(name, length),
            Some("udp://tracker.example:1337/announce"),
            None,
        )
    }

    pub fn message(chat_id: i64) -> Message {
        Message {
            message_id: 1,
            chat: Chat {
                id: chat_id,
                kind: Some("channel".to_string()),
                title: None,
            },
            text: None,
            caption: None,
            document: None,
        }
    }

    /// Channel post carrying `text`.
    pub fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
        let mut post = message(chat_id);
        post.text = Some(text.to_string());
        Update {
            update_id,
            message: None,
            channel_post: Some(post),
        }
    }

    /// Channel post with a `.torrent` attachment.
    pub fn document_update(
        update_id: i64,
        chat_id: i64,
        file_id: &str,
        file_name: &str,
        file_size: Option<u64>,
    ) -> Update {
        let mut post = message(chat_id);
        post.document = Some(Document {
            file_id: file_id.to_string(),
            file_unique_id: Some(format!("u-{}", file_id)),
            file_name: Some(file_name.to_string()),
            mime_type: Some("application/x-bittorrent".to_string()),
            file_size,
        });
        Update {
            update_id,
            message: None,
            channel_post: Some(post),
        }
    }
}
