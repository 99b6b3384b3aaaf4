//! Helper macro for declaring port error enums with snake-case constructors.

/// Declare a port error enum.
///
/// Each variant gets a `thiserror` message and a snake-case constructor whose
/// parameters accept anything convertible into the field types, so
/// `StoreError::query("boom")` builds `StoreError::Query { message }`.
macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@constructor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };

    (@constructor $variant:ident) => {
        ::paste::paste! {
            #[doc = "Build [`Self::" $variant "`]."]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[doc = "Build [`Self::" $variant "`]."]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        pub enum SamplePortError {
            Unavailable => "store unavailable",
            Query { message: String } => "query failed: {message}",
            Status { status: u16, message: String } => "status {status}: {message}",
        }
    }

    #[rstest]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(SamplePortError::unavailable(), SamplePortError::Unavailable);
    }

    #[rstest]
    fn string_fields_accept_str_slices() {
        let err = SamplePortError::query("relation missing");
        assert_eq!(err.to_string(), "query failed: relation missing");
    }

    #[rstest]
    fn mixed_fields_keep_their_types() {
        let err = SamplePortError::status(502_u16, "bad gateway");
        assert_eq!(
            err,
            SamplePortError::Status {
                status: 502,
                message: "bad gateway".to_owned(),
            }
        );
        assert_eq!(err.to_string(), "status 502: bad gateway");
    }
}
