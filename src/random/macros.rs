/// Declares a zero-sized key type naming an independent stream in an
/// [`RngStore`](crate::random::RngStore). An optional visibility goes before the name.
///
/// The stream is seeded from its name, so two keys with the same name would draw identical
/// sequences. Each name also defines an exported guard symbol, which turns a repeated name
/// anywhere in the final binary into a link error.
#[macro_export]
macro_rules! define_rng {
    ($vis:vis $random_id:ident) => {
        #[derive(Copy, Clone)]
        $vis struct $random_id;

        impl $crate::random::RngId for $random_id {
            type RngType = $crate::rand::rngs::SmallRng;

            fn get_name() -> &'static str {
                stringify!($random_id)
            }
        }

        $crate::paste::paste! {
            #[doc(hidden)]
            #[no_mangle]
            #[allow(non_upper_case_globals)]
            pub static [<sirv_rng_stream_ $random_id>]: () = ();
        }
    };
}
pub use define_rng;
