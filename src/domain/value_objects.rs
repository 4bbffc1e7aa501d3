use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 識別子のバリデーションエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdError {
    /// 値が指定されていない
    #[error("is required")]
    Missing,
    /// 0以下の値
    #[error("must be a positive integer (got {0})")]
    NonPositive(i64),
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            /// ストアが採番した値から作成する
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// リクエスト由来の値を検証して作成する
            pub fn parse(raw: Option<i64>) -> Result<Self, IdError> {
                match raw {
                    None => Err(IdError::Missing),
                    Some(value) if value <= 0 => Err(IdError::NonPositive(value)),
                    Some(value) => Ok(Self(value)),
                }
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// 書籍ID
    BookId
);

entity_id!(
    /// 利用者ID
    BorrowerId
);

entity_id!(
    /// 貸出ID
    ///
    /// ストアが昇順に採番するため、IDの順序は作成順と一致する。
    LoanId
);

/// テキスト項目の最大長（文字数）
pub const MAX_TEXT_LENGTH: usize = 255;

/// テキスト項目のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    /// 空文字（前後の空白を除く）
    #[error("must not be empty")]
    Empty,
    /// 最大長を超えている
    #[error("must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },
}

/// 必須テキスト（書名・著者名・利用者名）
///
/// 不変条件：前後の空白を除去済み、空でない、255文字以内。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredText(String);

impl RequiredText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RequiredText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }

        let length = trimmed.chars().count();
        if length > MAX_TEXT_LENGTH {
            return Err(TextError::TooLong {
                max: MAX_TEXT_LENGTH,
                actual: length,
            });
        }

        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<&str> for RequiredText {
    type Error = TextError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}
