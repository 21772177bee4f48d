use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, spanned::Spanned, FnArg, GenericArgument, Ident, ItemFn, PathArguments,
    Signature, Type,
};

/// Which record store the test server runs over.
#[derive(Clone, Copy, PartialEq, Eq)]
enum StoreKind {
    Memory,
    Mongo,
}

/// Transform an asynchronous test into a synchronous one running against a
/// server over a fresh example store, and inject dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// the store behind it, either `Arc<MemoryStore>` (the default) or
/// `Arc<MongoStore>`. A MongoDB test runs in a randomly named database which
/// is dropped however the test terminates, and is skipped if no `db_uri` is
/// configured.
///
/// `#[backend_test(closed)]` starts the test with voting closed.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract type information and reject invalid function signatures.
    let (test_args, kind) = match check_sig(&item_fn.sig) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Close voting before the test if asked to.
    let maybe_close = match parse_macro_input!(args as Option<Ident>) {
        Some(arg) if arg == "closed" => quote! {
            crate::store::RecordStore::set_voting_open(&*store, false)
                .await
                .unwrap();
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `closed` or no argument")
                .into_compile_error()
                .into();
        }
        None => TokenStream2::new(),
    };

    let init_logging = quote! {
        log4rs_test_utils::test_logging::init_logging_once_for(["carshow_voting"], None, None);
    };

    // Rewrite the test function.
    match kind {
        StoreKind::Memory => quote! {
            #[test]
            fn #name() {
                /// Test setup.
                async fn setup() -> (
                    rocket::local::asynchronous::Client,
                    std::sync::Arc<crate::store::MemoryStore>,
                ) {
                    #init_logging
                    let store = std::sync::Arc::new(crate::store::MemoryStore::example());

                    #maybe_close

                    let rocket_client =
                        rocket::local::asynchronous::Client::tracked(crate::rocket_for_store(store.clone()))
                            .await
                            .unwrap();
                    (rocket_client, store)
                }

                /// The test itself.
                #item_fn

                let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                    .thread_name("rocket-worker-test-thread")
                    .worker_threads(1)
                    .enable_all()
                    .build()
                    .unwrap();
                runtime.block_on(async {
                    #[allow(unused_variables)]
                    let (rocket_client, store) = setup().await;
                    #new_name(#(#test_args),*).await;
                });
            }
        },
        StoreKind::Mongo => quote! {
            #[test]
            fn #name() {
                /// Test setup. `None` if there is no database to test against.
                async fn setup() -> Option<(
                    rocket::local::asynchronous::Client,
                    std::sync::Arc<crate::store::MongoStore>,
                )> {
                    #init_logging
                    let store = std::sync::Arc::new(crate::store::MongoStore::example().await?);

                    #maybe_close

                    let rocket_client =
                        rocket::local::asynchronous::Client::tracked(crate::rocket_for_store(store.clone()))
                            .await
                            .unwrap();
                    Some((rocket_client, store))
                }

                /// The test itself.
                #item_fn

                /// Test cleanup.
                async fn cleanup(store: std::sync::Arc<crate::store::MongoStore>) {
                    store.drop_database().await;
                }

                // Create an async runtime. We need a separate one for inside and
                // outside the `catch_unwind`.
                let outer_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                    .thread_name("test-setup-cleanup")
                    .worker_threads(1)
                    .enable_all()
                    .build()
                    .unwrap();
                let inner_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                    .thread_name("rocket-worker-test-thread")
                    .worker_threads(1)
                    .enable_all()
                    .build()
                    .unwrap();

                // Run the setup.
                let (rocket_client, store) = match outer_runtime.block_on(setup()) {
                    Some(setup) => setup,
                    None => return,
                };

                // Run the test, catching any panics.
                // Use mutexes to safely transfer `!UnwindSafe` data.
                let client_mutex = std::sync::Mutex::new(rocket_client);
                let store_mutex = std::sync::Mutex::new(store.clone());
                let runtime_mutex = std::sync::Mutex::new(inner_runtime);
                let result = std::panic::catch_unwind(|| {
                    #[allow(unused_variables)]
                    let rocket_client = client_mutex.into_inner().unwrap();
                    #[allow(unused_variables)]
                    let store = store_mutex.into_inner().unwrap();
                    let runtime = runtime_mutex.into_inner().unwrap();

                    runtime.block_on(#new_name(#(#test_args),*));
                });

                // Run the cleanup.
                outer_runtime.block_on(cleanup(store));

                // If the test panicked, re-raise the panic.
                if let Err(cause) = result {
                    std::panic::resume_unwind(cause);
                }
            }
        },
    }
    .into()
}

/// Check the test's arguments, returning what to pass for each and which
/// store the test needs.
fn check_sig(sig: &Signature) -> Result<(Vec<TokenStream2>, StoreKind), syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(
            sig.fn_token.span(),
            "Test function must be `async`",
        ));
    }

    let mut has_client = false;
    let mut store_kind = None;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Type::Path(type_path) = &*pat_type.ty {
                // Valid as the last path segment for any type is itself.
                let Some(last) = type_path.path.segments.last() else {
                    continue;
                };
                if last.ident == "Client" {
                    if has_client {
                        return Err(syn::Error::new(
                            input.span(),
                            "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                        ));
                    }
                    has_client = true;
                    args.push(quote! { rocket_client });
                    continue;
                } else if last.ident == "Arc" {
                    if let Some(kind) = store_kind_of(&last.arguments) {
                        if store_kind.is_some() {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one store",
                            ));
                        }
                        store_kind = Some(kind);
                        args.push(quote! { store.clone() });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client`, `store_ident: Arc<MemoryStore>` or `store_ident: Arc<MongoStore>`",
        ));
    }

    Ok((args, store_kind.unwrap_or(StoreKind::Memory)))
}

/// The store named by generic arguments of the form `<MemoryStore>` or `<MongoStore>`.
fn store_kind_of(arguments: &PathArguments) -> Option<StoreKind> {
    let PathArguments::AngleBracketed(generics) = arguments else {
        return None;
    };
    if generics.args.len() != 1 {
        return None;
    }
    let Some(GenericArgument::Type(Type::Path(inner))) = generics.args.first() else {
        return None;
    };
    let ident = &inner.path.segments.last()?.ident;
    if ident == "MemoryStore" {
        Some(StoreKind::Memory)
    } else if ident == "MongoStore" {
        Some(StoreKind::Mongo)
    } else {
        None
    }
}
