//! Offset pagination behind opaque page tokens.
//!
//! The token is the decimal form of a non-negative offset. Clients must treat
//! it as opaque; the decoder accepts only what [`encode_token`] produces plus
//! the empty string.
//!
//! Listings over-fetch by one record: if the collaborator returns more than
//! `limit` rows a next page exists, and the extra row is dropped before the
//! page is returned.

use crate::error::Status;

/// Page size used when the request does not ask for one.
pub const DEFAULT_PAGE_SIZE: i32 = 20;
/// Largest page size served; larger requests are truncated.
pub const MAX_PAGE_SIZE: i32 = 100;

/// Resolves the effective page size.
///
/// ```
/// use catalog_boundary::pagination::resolve_page_size;
///
/// assert_eq!(resolve_page_size(0), 20);
/// assert_eq!(resolve_page_size(500), 100);
/// assert_eq!(resolve_page_size(7), 7);
/// ```
pub fn resolve_page_size(requested: i32) -> i32 {
    if requested <= 0 {
        return DEFAULT_PAGE_SIZE;
    }
    requested.min(MAX_PAGE_SIZE)
}

/// Decodes a page token into an offset.
///
/// `""` is offset 0. A negative number is clamped to 0. Anything else that is
/// not a canonical decimal integer in `i32` range is `InvalidArgument`;
/// leading zeros are rejected (`"0"` itself is fine).
pub fn decode_token(token: &str) -> Result<i32, Status> {
    if token.is_empty() {
        return Ok(0);
    }

    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Status::invalid_argument(
            "invalid page_token: expected a numeric offset",
        ));
    }
    // Only "0" itself may start with a zero
    if digits.starts_with('0') && (negative || digits.len() > 1) {
        return Err(Status::invalid_argument(
            "invalid page_token: not a canonical offset",
        ));
    }
    if negative {
        // TODO: confirm with API owners whether negative offsets should be rejected like other malformed tokens
        return Ok(0);
    }

    digits
        .parse::<i32>()
        .map_err(|_| Status::invalid_argument("invalid page_token: offset out of range"))
}

/// Encodes an offset as a page token.
pub fn encode_token(offset: i32) -> String {
    offset.max(0).to_string()
}

/// Resolved position and size of one page.
///
/// Only [`PageCursor::from_request`] builds a cursor, so the limit is always
/// within `1..=MAX_PAGE_SIZE` and the offset is never negative.
///
/// ```compile_fail
/// use catalog_boundary::PageCursor;
///
/// let cursor = PageCursor { limit: 0, offset: -1 };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    limit: i32,
    offset: i32,
}

impl PageCursor {
    /// Resolves a cursor from a request's page size and token.
    ///
    /// # Examples
    ///
    /// ```
    /// use catalog_boundary::PageCursor;
    ///
    /// let cursor = PageCursor::from_request(0, "40").unwrap();
    /// assert_eq!((cursor.limit(), cursor.offset()), (20, 40));
    /// assert!(PageCursor::from_request(10, "abc").is_err());
    /// ```
    pub fn from_request(page_size: i32, page_token: &str) -> Result<Self, Status> {
        Ok(Self {
            limit: resolve_page_size(page_size),
            offset: decode_token(page_token)?,
        })
    }

    /// Effective page size.
    pub fn limit(&self) -> i32 {
        self.limit
    }

    /// Offset of the first record.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Number of rows to request from the collaborator (one extra).
    pub fn fetch_limit(&self) -> i32 {
        self.limit + 1
    }

    /// Trims an over-fetched result into a page.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the next offset would overflow.
    pub fn paginate<T>(&self, mut records: Vec<T>) -> Result<Page<T>, Status> {
        let limit = self.limit as usize;
        if records.len() <= limit {
            return Ok(Page {
                items: records,
                next_page_token: String::new(),
            });
        }

        records.truncate(limit);
        let next = self
            .offset
            .checked_add(self.limit)
            .ok_or_else(|| Status::invalid_argument("invalid page_token: offset out of range"))?;
        Ok(Page {
            items: records,
            next_page_token: encode_token(next),
        })
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// At most `limit` records
    pub items: Vec<T>,
    /// Token for the next page; empty on the last page
    pub next_page_token: String,
}

impl<T> Page<T> {
    /// Whether another page follows.
    pub fn has_next(&self) -> bool {
        !self.next_page_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Code;

    #[test]
    fn empty_token_is_offset_zero() {
        assert_eq!(decode_token("").unwrap(), 0);
    }

    #[test]
    fn non_numeric_token_is_client_error() {
        for token in ["abc", "12a", "-", "+5", " 5", "1.5", "--3"] {
            let err = decode_token(token).unwrap_err();
            assert_eq!(err.code, Code::InvalidArgument, "token {token:?}");
        }
    }

    #[test]
    fn non_canonical_token_is_client_error() {
        for token in ["007", "00", "01", "-0", "-05"] {
            let err = decode_token(token).unwrap_err();
            assert_eq!(err.code, Code::InvalidArgument, "token {token:?}");
        }
        assert_eq!(decode_token("0").unwrap(), 0);
        assert_eq!(decode_token("70").unwrap(), 70);
    }

    #[test]
    fn cursor_fields_stay_in_bounds() {
        for (size, token) in [(0, ""), (-7, "-3"), (i32::MAX, "15")] {
            let cursor = PageCursor::from_request(size, token).unwrap();
            assert!((1..=MAX_PAGE_SIZE).contains(&cursor.limit()));
            assert!(cursor.offset() >= 0);
            assert_eq!(cursor.fetch_limit(), cursor.limit() + 1);
        }
    }

    #[test]
    fn negative_token_clamps_to_zero() {
        assert_eq!(decode_token("-5").unwrap(), 0);
        assert_eq!(decode_token("-99999999999999").unwrap(), 0);
    }

    #[test]
    fn overflowing_token_is_client_error() {
        assert_eq!(decode_token("2147483648").unwrap_err().code, Code::InvalidArgument);
        assert_eq!(decode_token("2147483647").unwrap(), i32::MAX);
    }

    #[test]
    fn page_size_bounds() {
        assert_eq!(resolve_page_size(-3), DEFAULT_PAGE_SIZE);
        assert_eq!(resolve_page_size(0), DEFAULT_PAGE_SIZE);
        assert_eq!(resolve_page_size(1), 1);
        assert_eq!(resolve_page_size(100), 100);
        assert_eq!(resolve_page_size(500), MAX_PAGE_SIZE);
    }

    #[test]
    fn overfetch_yields_next_token() {
        let cursor = PageCursor::from_request(2, "").unwrap();
        assert_eq!(cursor.fetch_limit(), 3);

        let page = cursor.paginate(vec!['a', 'b', 'c']).unwrap();
        assert_eq!(page.items, vec!['a', 'b']);
        assert_eq!(page.next_page_token, "2");
        assert!(page.has_next());
    }

    #[test]
    fn last_page_has_empty_token() {
        let cursor = PageCursor::from_request(2, "2").unwrap();
        let page = cursor.paginate(vec!['c']).unwrap();
        assert_eq!(page.items, vec!['c']);
        assert!(page.next_page_token.is_empty());
        assert!(!page.has_next());
    }

    #[test]
    fn exact_fit_has_no_next_page() {
        let cursor = PageCursor::from_request(2, "").unwrap();
        let page = cursor.paginate(vec![1, 2]).unwrap();
        assert!(!page.has_next());
    }

    #[test]
    fn next_offset_overflow_is_rejected() {
        let cursor = PageCursor {
            limit: 10,
            offset: i32::MAX - 5,
        };
        let err = cursor.paginate(vec![0; 11]).unwrap_err();
        assert_eq!(err.code, Code::InvalidArgument);
    }
}
