pub mod department;
pub mod employee;
pub mod role;
pub mod user;
pub mod vacation_request;

/// Implements the MySQL column mapping for a closed enum stored as its
/// string name. The enum must implement `AsRef<str>` and `FromStr`.
macro_rules! mysql_string_enum {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::MySql> for $ty {
            fn type_info() -> sqlx::mysql::MySqlTypeInfo {
                <str as sqlx::Type<sqlx::MySql>>::type_info()
            }

            fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
                <str as sqlx::Type<sqlx::MySql>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::MySql> for $ty {
            fn decode(
                value: sqlx::mysql::MySqlValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<sqlx::MySql>>::decode(value)?;
                Ok(raw.parse::<$ty>()?)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::MySql> for $ty {
            fn encode_by_ref(&self, buf: &mut Vec<u8>) -> sqlx::encode::IsNull {
                let raw: &str = self.as_ref();
                <&str as sqlx::Encode<'q, sqlx::MySql>>::encode_by_ref(&raw, buf)
            }
        }
    };
}

pub(crate) use mysql_string_enum;
