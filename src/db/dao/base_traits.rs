pub trait HasIdActiveModel {
    fn set_id(&mut self, id: uuid::Uuid);
}
