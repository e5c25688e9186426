// @generated by routegen. DO NOT EDIT.
//! Route registration for `generated-app`.
#![allow(unused_mut, clippy::all)]
/// Modules that contributed route handlers
pub const SOURCE_MODULES: &[&str] = &["crate::handlers"];
/// Register every route handled by `&UserController`
pub fn register_user_controller(
    table: &mut ::routegen::DispatchTable,
    controller: ::std::sync::Arc<crate::handlers::users::UserController>,
) -> ::std::result::Result<(), ::routegen::DispatchError> {
    {
        let controller = ::std::sync::Arc::clone(&controller);
        table
            .register(
                &["POST"],
                "/users",
                move |req: &mut ::routegen::BindRequest, resp: &::routegen::ResponseWriter| {
                    let p0: routegen::Form<String> = ::routegen::bind("name", req, resp)?;
                    let p1: routegen::Query<String> = ::routegen::bind("role", req, resp)?;
                    let result = controller.create(&p0, p1);
                    ::routegen::Responder::write(result, resp)?;
                    Ok(())
                },
            )?;
    }
    {
        let controller = ::std::sync::Arc::clone(&controller);
        table
            .register(
                &["GET"],
                "/users/:id",
                move |req: &mut ::routegen::BindRequest, resp: &::routegen::ResponseWriter| {
                    let p0: routegen::Path<i64> = ::routegen::bind("id", req, resp)?;
                    let p1: routegen::Header<String> = ::routegen::bind("x_trace", req, resp)?;
                    let result = controller.get(p0, p1);
                    ::routegen::Responder::write(result, resp)?;
                    Ok(())
                },
            )?;
    }
    Ok(())
}
/// Register every route handled by `&mut Counter`
pub fn register_counter_mut(
    table: &mut ::routegen::DispatchTable,
    controller: ::std::sync::Arc<::std::sync::Mutex<crate::handlers::counter::Counter>>,
) -> ::std::result::Result<(), ::routegen::DispatchError> {
    {
        let controller = ::std::sync::Arc::clone(&controller);
        table
            .register(
                &["POST"],
                "/count",
                move |req: &mut ::routegen::BindRequest, resp: &::routegen::ResponseWriter| {
                    let p0: routegen::Form<i64> = ::routegen::bind("by", req, resp)?;
                    let mut guard = controller
                        .lock()
                        .map_err(|_| ::routegen::DispatchError::ControllerPoisoned)?;
                    let result = guard.bump(p0);
                    ::routegen::Responder::write(result, resp)?;
                    Ok(())
                },
            )?;
    }
    Ok(())
}
/// Describe every registered route as an OpenAPI document
pub fn api_document(title: &str, version: &str) -> ::routegen::ApiDocument {
    let mut doc = ::routegen::ApiDocument::new(title, version);
    {
        let mut op = ::routegen::OperationDoc::new("create");
        <routegen::Form<String> as ::routegen::Binder>::describe("name", &mut op);
        <routegen::Query<String> as ::routegen::Binder>::describe("role", &mut op);
        <routegen::JsonResponse<String> as ::routegen::Responder>::describe(&mut op);
        doc.add_operation("/users", &["POST"], op);
    }
    {
        let mut op = ::routegen::OperationDoc::new("get");
        <routegen::Path<i64> as ::routegen::Binder>::describe("id", &mut op);
        <routegen::Header<String> as ::routegen::Binder>::describe("x_trace", &mut op);
        <routegen::JsonResponse<String> as ::routegen::Responder>::describe(&mut op);
        doc.add_operation("/users/:id", &["GET"], op);
    }
    {
        let mut op = ::routegen::OperationDoc::new("bump");
        <routegen::Form<i64> as ::routegen::Binder>::describe("by", &mut op);
        <routegen::JsonResponse<i64> as ::routegen::Responder>::describe(&mut op);
        doc.add_operation("/count", &["POST"], op);
    }
    doc
}
